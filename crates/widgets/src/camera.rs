//! Camera widget: the latest still of a camera entity.
//!
//! The value source puts the still (JPEG or PNG) into the entity snapshot, so
//! drawing stays synchronous and replayable like every other widget.

use cairo::Context;
use serde_json::json;
use tinydash_core::{Bitmap, ConfigError, ConfigOption, ConfigSchema, RenderError, WidgetContext, WidgetRenderer};
use tinydash_render::{draw_text, font, rounded_rectangle, truncate_to_width, FontRole, HAlign, VAlign};
use tinydash_types::{Color, Options, WidgetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Whole image visible, letterboxed
    Contain,
    /// Fill the slot, cropping the overflow
    Cover,
    /// Fill the slot, ignoring aspect ratio
    Stretch,
}

impl Fit {
    pub fn from_options(options: &Options) -> Result<Self, ConfigError> {
        match options.str_or("fit", "contain").to_ascii_lowercase().as_str() {
            "contain" => Ok(Fit::Contain),
            "cover" => Ok(Fit::Cover),
            "stretch" => Ok(Fit::Stretch),
            other => Err(ConfigError::InvalidOption {
                key: "fit".to_string(),
                reason: format!("'{}' is not one of contain, cover, stretch", other),
            }),
        }
    }

    /// (scale_x, scale_y, offset_x, offset_y) mapping the image into the box
    pub fn transform(&self, img_w: f64, img_h: f64, w: f64, h: f64) -> (f64, f64, f64, f64) {
        match self {
            Fit::Stretch => (w / img_w, h / img_h, 0.0, 0.0),
            Fit::Contain | Fit::Cover => {
                let scale = if *self == Fit::Contain {
                    (w / img_w).min(h / img_h)
                } else {
                    (w / img_w).max(h / img_h)
                };
                (scale, scale, (w - img_w * scale) / 2.0, (h - img_h * scale) / 2.0)
            }
        }
    }
}

pub struct CameraWidget;

impl WidgetRenderer for CameraWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Camera
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigOption::new("fit", "string", json!("contain"), "contain, cover or stretch"),
            ConfigOption::new("show_label", "boolean", json!(true), "Name strip along the bottom"),
        ])
    }

    fn wants_panel(&self) -> bool {
        false
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let fit = Fit::from_options(ctx.options())?;
        let state = ctx.primary_state()?;
        let encoded = state
            .image
            .as_ref()
            .ok_or_else(|| RenderError::DataUnavailable(state.entity_id.clone()))?;
        let image = Bitmap::decode(encoded)
            .map_err(|e| RenderError::Other(format!("{}: {}", state.entity_id, e)))?
            .to_surface()?;

        let (w, h) = (ctx.width, ctx.height);
        let (img_w, img_h) = (image.width() as f64, image.height() as f64);
        if img_w <= 0.0 || img_h <= 0.0 {
            return Err(RenderError::DataUnavailable(state.entity_id.clone()));
        }

        cr.save()?;
        rounded_rectangle(cr, 0.0, 0.0, w, h, ctx.theme.panel.corner_radius);
        cr.clip();
        let (sx, sy, ox, oy) = fit.transform(img_w, img_h, w, h);
        cr.translate(ox, oy);
        cr.scale(sx, sy);
        cr.set_source_surface(&image, 0.0, 0.0)?;
        cr.paint()?;
        cr.restore()?;

        if ctx.options().bool_or("show_label", true) {
            let small = font(ctx.theme, FontRole::Small, w, h);
            let strip_h = small.size * 1.6;
            cr.save()?;
            Color::BLACK.with_alpha(0.55).apply_to_cairo(cr);
            cr.rectangle(0.0, h - strip_h, w, strip_h);
            cr.fill()?;
            cr.restore()?;
            let label = ctx.label_or(Some(state), &state.entity_id);
            let label = truncate_to_width(cr, &label, &small, w - 8.0);
            draw_text(cr, &label, &small, Color::WHITE, 4.0, h - strip_h / 2.0, HAlign::Left, VAlign::Middle)?;
        }
        Ok(())
    }
}
