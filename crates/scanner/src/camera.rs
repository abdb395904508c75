use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Symbolic camera orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear-facing.
    Environment,
    /// Front-facing.
    User,
}

impl FacingMode {
    pub const ALL: [FacingMode; 2] = [FacingMode::Environment, FacingMode::User];

    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown facing mode: {0}")]
pub struct UnknownFacingMode(pub String);

impl FromStr for FacingMode {
    type Err = UnknownFacingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "environment" => Ok(FacingMode::Environment),
            "user" => Ok(FacingMode::User),
            other => Err(UnknownFacingMode(other.to_string())),
        }
    }
}

/// A video input as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDescriptor {
    pub id: String,
    pub label: String,
    /// Present only when the platform reports orientation metadata.
    pub facing: Option<FacingMode>,
}

impl CameraDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            facing: None,
        }
    }

    pub fn facing(mut self, facing: FacingMode) -> Self {
        self.facing = Some(facing);
        self
    }
}

/// What a camera binding or switch request targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum CameraChoice {
    Facing(FacingMode),
    Device(String),
}

/// How the switcher maps user choices onto cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Fewer than two cameras; the platform default is used and no switcher shown.
    Implicit,
    FacingMode,
    DeviceId,
}

/// Camera list captured once per session, reduced to one switching scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSelector {
    strategy: SelectionStrategy,
    choices: Vec<CameraChoice>,
    initial: CameraChoice,
}

impl CameraSelector {
    pub fn from_descriptors(descriptors: &[CameraDescriptor], preferred: FacingMode) -> Self {
        let implicit = Self {
            strategy: SelectionStrategy::Implicit,
            choices: Vec::new(),
            initial: CameraChoice::Facing(preferred),
        };
        if descriptors.len() < 2 {
            return implicit;
        }

        let reported: Vec<FacingMode> = FacingMode::ALL
            .into_iter()
            .filter(|mode| descriptors.iter().any(|d| d.facing == Some(*mode)))
            .collect();

        if reported.len() >= 2 {
            return Self {
                strategy: SelectionStrategy::FacingMode,
                choices: reported.into_iter().map(CameraChoice::Facing).collect(),
                initial: CameraChoice::Facing(preferred),
            };
        }

        let initial = descriptors
            .iter()
            .find(|d| d.facing == Some(preferred))
            .unwrap_or(&descriptors[0]);
        Self {
            strategy: SelectionStrategy::DeviceId,
            choices: descriptors
                .iter()
                .map(|d| CameraChoice::Device(d.id.clone()))
                .collect(),
            initial: CameraChoice::Device(initial.id.clone()),
        }
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Choices for the switcher; empty when it is hidden.
    pub fn choices(&self) -> &[CameraChoice] {
        &self.choices
    }

    pub fn show_switcher(&self) -> bool {
        self.choices.len() >= 2
    }

    /// Camera to bind when the session starts.
    pub fn initial(&self) -> CameraChoice {
        self.initial.clone()
    }

    pub fn offers(&self, choice: &CameraChoice) -> bool {
        self.choices.contains(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cameras_hides_switcher() {
        let selector = CameraSelector::from_descriptors(&[], FacingMode::Environment);
        assert_eq!(selector.strategy(), SelectionStrategy::Implicit);
        assert!(!selector.show_switcher());
        assert_eq!(selector.initial(), CameraChoice::Facing(FacingMode::Environment));
    }

    #[test]
    fn single_camera_hides_switcher() {
        let cameras = [CameraDescriptor::new("cam-1", "Built-in").facing(FacingMode::User)];
        let selector = CameraSelector::from_descriptors(&cameras, FacingMode::Environment);
        assert!(!selector.show_switcher());
        assert!(selector.choices().is_empty());
    }

    #[test]
    fn facing_metadata_selects_symbolic_modes() {
        let cameras = [
            CameraDescriptor::new("front", "Front").facing(FacingMode::User),
            CameraDescriptor::new("back", "Back").facing(FacingMode::Environment),
            CameraDescriptor::new("wide", "Back wide").facing(FacingMode::Environment),
        ];
        let selector = CameraSelector::from_descriptors(&cameras, FacingMode::Environment);
        assert_eq!(selector.strategy(), SelectionStrategy::FacingMode);
        assert_eq!(
            selector.choices(),
            &[
                CameraChoice::Facing(FacingMode::Environment),
                CameraChoice::Facing(FacingMode::User)
            ]
        );
        assert!(selector.show_switcher());
        assert_eq!(selector.initial(), CameraChoice::Facing(FacingMode::Environment));
    }

    #[test]
    fn missing_metadata_falls_back_to_device_ids() {
        let cameras = [
            CameraDescriptor::new("usb-a", "USB camera"),
            CameraDescriptor::new("usb-b", "Capture card"),
        ];
        let selector = CameraSelector::from_descriptors(&cameras, FacingMode::Environment);
        assert_eq!(selector.strategy(), SelectionStrategy::DeviceId);
        assert_eq!(selector.initial(), CameraChoice::Device("usb-a".into()));
        assert!(selector.offers(&CameraChoice::Device("usb-b".into())));
        assert!(!selector.offers(&CameraChoice::Facing(FacingMode::User)));
    }

    #[test]
    fn single_reported_orientation_uses_device_ids() {
        let cameras = [
            CameraDescriptor::new("a", "Back").facing(FacingMode::Environment),
            CameraDescriptor::new("b", "Back tele").facing(FacingMode::Environment),
        ];
        let selector = CameraSelector::from_descriptors(&cameras, FacingMode::User);
        assert_eq!(selector.strategy(), SelectionStrategy::DeviceId);
        assert_eq!(selector.initial(), CameraChoice::Device("a".into()));
    }

    #[test]
    fn device_strategy_prefers_matching_orientation() {
        let cameras = [
            CameraDescriptor::new("a", "Unknown"),
            CameraDescriptor::new("b", "Selfie").facing(FacingMode::User),
        ];
        let selector = CameraSelector::from_descriptors(&cameras, FacingMode::User);
        assert_eq!(selector.initial(), CameraChoice::Device("b".into()));
    }

    #[test]
    fn choices_use_tagged_json() {
        assert_eq!(
            serde_json::to_value(CameraChoice::Facing(FacingMode::Environment)).unwrap(),
            serde_json::json!({ "kind": "facing", "value": "environment" })
        );
        let choice: CameraChoice =
            serde_json::from_str(r#"{ "kind": "device", "value": "usb-b" }"#).unwrap();
        assert_eq!(choice, CameraChoice::Device("usb-b".into()));
    }

    #[test]
    fn descriptors_parse_without_facing() {
        let cameras: Vec<CameraDescriptor> = serde_json::from_str(
            r#"[
                { "id": "a", "label": "Back", "facing": "environment" },
                { "id": "b", "label": "USB camera", "facing": null }
            ]"#,
        )
        .unwrap();
        assert_eq!(
            cameras,
            vec![
                CameraDescriptor::new("a", "Back").facing(FacingMode::Environment),
                CameraDescriptor::new("b", "USB camera"),
            ]
        );
    }

    #[test]
    fn facing_mode_parses() {
        assert_eq!("user".parse::<FacingMode>().unwrap(), FacingMode::User);
        assert!("side".parse::<FacingMode>().is_err());
    }
}
