//! # UI Module
//!
//! This module contains the text views of the interval trainer.

pub mod cent_meter;
pub mod main_display;
