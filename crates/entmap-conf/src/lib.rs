//! # entmap configuration
//!
//! Layered settings for the entmap metadata pipeline.
//!
//! Settings are merged from several sources in priority order
//! (environment variables > settings file > defaults) and deserialized into
//! [`MetadataSettings`].
//!
//! ## Quick Start
//!
//! ```rust
//! use entmap_conf::settings::builder::SettingsBuilder;
//! use entmap_conf::settings::sources::DefaultSource;
//!
//! let settings = SettingsBuilder::new()
//!     .add_source(DefaultSource::new().with_value("weaving_enabled", true.into()))
//!     .build()
//!     .unwrap();
//! assert!(settings.weaving_enabled);
//! ```
//!
//! ## Module Organization
//!
//! - [`settings`]: the settings record, its sources and the builder

pub mod settings;

pub use settings::{
	AccessType, CyclePolicy, KeyCompatibilityPolicy, MetadataSettings, SettingsError,
};
