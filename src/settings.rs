use std::path::Path;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

pub const CONFY_APP_NAME: &str = "spine-viewer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub initial_scale: f32,
    pub initial_speed: f32,
    pub initial_overlay_scale: f32,
    /// Clamp the render scale so the entity fits inside the viewport.
    pub fit_to_viewport: bool,
    /// Fraction of the viewport the fit clamp allows the entity to cover.
    pub fit_margin: f32,
    pub marker_radius: f32,
    pub marker_color: [u8; 3],
    pub background_color: [f32; 3],
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            initial_scale: 0.5,
            initial_speed: 1.0,
            initial_overlay_scale: 1.0,
            fit_to_viewport: false,
            fit_margin: 0.9,
            marker_radius: 10.0,
            marker_color: [255, 0, 0],
            background_color: [0.95, 0.95, 0.95],
        }
    }
}

/// Read user-authored defaults. Runtime changes are never written back, so
/// every launch starts from this file.
fn load_config<T>(config_name: &str) -> T
where
    T: Serialize + DeserializeOwned + Default,
{
    match confy::get_configuration_file_path(CONFY_APP_NAME, config_name) {
        Ok(path) => load_config_path(&path),
        Err(e) => {
            log::warn!("No {config_name} settings location: {e}");
            T::default()
        }
    }
}

fn load_config_path<T>(path: &Path) -> T
where
    T: Serialize + DeserializeOwned + Default,
{
    confy::load_path(path).unwrap_or_else(|e| {
        log::warn!("Falling back to default settings for {}: {e}", path.display());
        T::default()
    })
}

impl ViewerSettings {
    pub fn load() -> Self {
        load_config("viewer")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub show_slots: bool,
    pub show_texture_panel: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            show_slots: true,
            show_texture_panel: false,
        }
    }
}

impl UiSettings {
    pub fn load() -> Self {
        load_config("ui")
    }
}

// Aggregate struct for convenience
pub struct Settings {
    pub viewer: ViewerSettings,
    pub ui: UiSettings,
}

impl Settings {
    pub fn load() -> Self {
        Self {
            viewer: ViewerSettings::load(),
            ui: UiSettings::load(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_file_overrides_defaults_and_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        let authored = "fit_to_viewport = true\nmarker_radius = 4.0\n";
        std::fs::write(&path, authored).unwrap();

        let settings: ViewerSettings = load_config_path(&path);
        assert!(settings.fit_to_viewport);
        assert_eq!(settings.marker_radius, 4.0);
        assert_eq!(settings.initial_scale, 0.5);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), authored);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui.toml");
        std::fs::write(&path, "show_slots = [not toml").unwrap();

        let settings: UiSettings = load_config_path(&path);
        assert!(settings.show_slots);
        assert!(!settings.show_texture_panel);
    }

    #[test]
    fn fit_clamp_is_off_by_default() {
        assert!(!ViewerSettings::default().fit_to_viewport);
    }
}
