// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Projector configuration system

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File read by [`ProjectorConfig::load`] when present in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "projector.toml";

/// Projector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Smallest signed sub-area for which a point still counts as inside a triangle
    pub triangle_area_tolerance: f64,
    /// When set, every projection records this signed distance instead of the measured one
    pub surface_offset: Option<f64>,
    /// Largest accepted gap between a point and its reconstructed projection
    pub projection_distance_error: f64,
    /// How many random nudges to try when a point cannot be projected
    pub perturbation_attempts: u32,
    /// Width of the nudge applied on each attempt
    pub perturbation_magnitude: f64,
    /// Fixed seed for the nudges; `None` seeds from OS entropy
    pub perturbation_seed: Option<u64>,
    /// Reconstruct every projection and log how far it lands from the input
    pub validate: bool,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            triangle_area_tolerance: -0.01,
            surface_offset: None,
            projection_distance_error: 0.5,
            perturbation_attempts: 10,
            perturbation_magnitude: 0.5,
            perturbation_seed: None,
            validate: false,
        }
    }
}

impl ProjectorConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: ProjectorConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.check()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        config.check()?;
        Ok(config)
    }

    /// Apply `PROJECTOR_*` environment variables on top of the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(tolerance) = lookup("PROJECTOR_TRIANGLE_AREA_TOLERANCE") {
            self.triangle_area_tolerance = tolerance
                .parse()
                .with_context(|| format!("Invalid PROJECTOR_TRIANGLE_AREA_TOLERANCE: {tolerance}"))?;
        }

        if let Some(offset) = lookup("PROJECTOR_SURFACE_OFFSET") {
            self.surface_offset = if offset.is_empty() {
                None
            } else {
                Some(
                    offset
                        .parse()
                        .with_context(|| format!("Invalid PROJECTOR_SURFACE_OFFSET: {offset}"))?,
                )
            };
        }

        if let Some(error) = lookup("PROJECTOR_DISTANCE_ERROR") {
            self.projection_distance_error = error
                .parse()
                .with_context(|| format!("Invalid PROJECTOR_DISTANCE_ERROR: {error}"))?;
        }

        if let Some(validate) = lookup("PROJECTOR_VALIDATE") {
            self.validate = validate
                .parse()
                .with_context(|| format!("Invalid PROJECTOR_VALIDATE: {validate}"))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Reject values the projector cannot work with
    pub fn check(&self) -> Result<()> {
        ensure!(
            self.triangle_area_tolerance.is_finite(),
            "triangle_area_tolerance must be finite"
        );
        ensure!(
            self.projection_distance_error > 0.0,
            "projection_distance_error must be positive, got {}",
            self.projection_distance_error
        );
        ensure!(
            self.perturbation_magnitude >= 0.0,
            "perturbation_magnitude must not be negative, got {}",
            self.perturbation_magnitude
        );
        if let Some(offset) = self.surface_offset {
            ensure!(offset.is_finite(), "surface_offset must be finite");
        }
        Ok(())
    }
}
