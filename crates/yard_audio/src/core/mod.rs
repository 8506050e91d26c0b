//! Core configuration types shared by the audio subsystems

pub mod config;
