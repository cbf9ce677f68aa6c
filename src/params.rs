use serde::Deserialize;

/// Inputs to the lightning shader that callers may change at any time.
///
/// Nothing here is validated: negative speeds, hues outside `[0, 360)` and the
/// like go straight to the GPU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParameters {
    /// Degrees.
    pub hue: f32,
    pub horizontal_offset: f32,
    pub speed: f32,
    pub intensity: f32,
    pub scale: f32,
}

impl Default for AnimationParameters {
    fn default() -> Self {
        Self {
            hue: 220.0,
            horizontal_offset: 0.0,
            speed: 1.6,
            intensity: 0.6,
            scale: 2.0,
        }
    }
}

impl AnimationParameters {
    pub fn from_options(options: &LightningOptions) -> Self {
        let mut params = Self::default();
        params.merge(options);
        params
    }

    /// Overwrites every field present in `update`; absent fields keep their
    /// current value.
    pub fn merge(&mut self, update: &LightningOptions) {
        if let Some(hue) = update.hue {
            self.hue = hue;
        }
        if let Some(x_offset) = update.x_offset {
            self.horizontal_offset = x_offset;
        }
        if let Some(speed) = update.speed {
            self.speed = speed;
        }
        if let Some(intensity) = update.intensity {
            self.intensity = intensity;
        }
        if let Some(size) = update.size {
            self.scale = size;
        }
    }
}

/// The options record handed over from JavaScript, used both at construction
/// and for partial updates.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LightningOptions {
    pub hue: Option<f32>,
    pub x_offset: Option<f32>,
    pub speed: Option<f32>,
    pub intensity: Option<f32>,
    pub size: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_give_defaults() {
        let params = AnimationParameters::from_options(&LightningOptions::default());
        assert_eq!(params, AnimationParameters::default());
        assert_eq!(params.hue, 220.0);
        assert_eq!(params.scale, 2.0);
    }

    #[test]
    fn zero_is_an_explicit_value() {
        let params = AnimationParameters::from_options(&LightningOptions {
            hue: Some(0.0),
            speed: Some(0.0),
            ..Default::default()
        });
        assert_eq!(params.hue, 0.0);
        assert_eq!(params.speed, 0.0);
        assert_eq!(params.intensity, 0.6);
    }

    #[test]
    fn merge_touches_only_given_fields() {
        let mut params = AnimationParameters::from_options(&LightningOptions {
            hue: Some(60.0),
            ..Default::default()
        });
        params.merge(&LightningOptions {
            speed: Some(3.0),
            ..Default::default()
        });
        assert_eq!(params.speed, 3.0);
        assert_eq!(params.hue, 60.0);
        assert_eq!(params.intensity, 0.6);
        assert_eq!(params.horizontal_offset, 0.0);
        assert_eq!(params.scale, 2.0);
    }

    #[test]
    fn options_use_camel_case_keys() {
        let options: LightningOptions =
            serde_json::from_str(r#"{ "hue": 300, "xOffset": 0.5, "size": 1.5, "extra": true }"#)
                .unwrap();
        assert_eq!(options.hue, Some(300.0));
        assert_eq!(options.x_offset, Some(0.5));
        assert_eq!(options.size, Some(1.5));
        assert_eq!(options.speed, None);
    }

    #[test]
    fn size_and_x_offset_map_to_scale_and_offset() {
        let mut params = AnimationParameters::default();
        params.merge(&LightningOptions {
            x_offset: Some(-0.25),
            size: Some(1.0),
            ..Default::default()
        });
        assert_eq!(params.horizontal_offset, -0.25);
        assert_eq!(params.scale, 1.0);
    }
}
