//! Scenario tests across segmenting, storage, retrieval and answering.

mod ranking;
mod segmentation;
mod support;
