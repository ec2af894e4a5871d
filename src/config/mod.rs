//! Configuration module for Klipp.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    AcquisitionSettings, ClipSettings, EmbeddingSettings, GeneralSettings, SearchSettings,
    Settings,
};
