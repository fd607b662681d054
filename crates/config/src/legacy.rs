//! Import of the flat settings blob persisted by the Obsidian plugin.
//!
//! The plugin stored everything in one `data.json` object with a two or
//! three letter prefix per library (`abDir`, `ebEnable`, `podTemplate`, ...).

use crate::error::{ErrorKind, Result};
use crate::settings::{LibrarySettings, Settings, SortBy};
use exn::ResultExt;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PluginData {
    host: String,
    api_key: String,
    ab_dir: String,
    ab_enable: bool,
    ab_lib: String,
    ab_sort_by: String,
    ab_template: String,
    eb_dir: String,
    eb_enable: bool,
    eb_lib: String,
    eb_sort_by: String,
    eb_template: String,
    pod_dir: String,
    pod_enable: bool,
    pod_lib: String,
    pod_sort_by: String,
    pod_template: String,
}

fn library(enable: bool, dir: String, lib: String, sort_by: String, template: String) -> LibrarySettings {
    LibrarySettings {
        enable,
        dir,
        lib,
        sort_by: SortBy::from(sort_by),
        template,
        ..LibrarySettings::default()
    }
}

impl From<PluginData> for Settings {
    fn from(data: PluginData) -> Self {
        Settings {
            host: data.host,
            api_key: data.api_key,
            audiobooks: library(data.ab_enable, data.ab_dir, data.ab_lib, data.ab_sort_by, data.ab_template),
            ebooks: library(data.eb_enable, data.eb_dir, data.eb_lib, data.eb_sort_by, data.eb_template),
            podcasts: library(data.pod_enable, data.pod_dir, data.pod_lib, data.pod_sort_by, data.pod_template),
            ..Settings::default()
        }
    }
}

impl Settings {
    /// Convert the contents of the plugin's `data.json`.
    ///
    /// Missing keys take their defaults, unknown keys are ignored.
    pub fn from_plugin_data(json: &str) -> Result<Self> {
        let data: PluginData = serde_json::from_str(json).or_raise(|| ErrorKind::Load)?;
        Ok(data.into())
    }
}
