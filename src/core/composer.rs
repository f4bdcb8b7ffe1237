//! Screen composition: layout, per-slot renders and theme chrome into one
//! full-canvas bitmap.
//!
//! Composition is synchronous and reads time only from the snapshot set, so
//! the same screen, snapshots and theme always produce the same pixels.

use cairo::Context;
use tinydash_core::constants::PLACEHOLDER_TEXT;
use tinydash_core::{
    slot_rects_or_fallback, Bitmap, Dependencies, PlaceholderReason, Rect, RenderError,
    WidgetRegistry, WidgetRender,
};
use tinydash_render::{draw_border, draw_panel, draw_placeholder, ThemeEngine};
use tinydash_types::{LayoutType, Resolution, ScreenConfig, SlotConfig, SnapshotSet, Theme};

/// Outcome of one slot, kept for logging and status reporting
#[derive(Debug, Clone, PartialEq)]
pub enum SlotStatus {
    Rendered,
    Placeholder(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotReport {
    pub index: usize,
    pub rect: Rect,
    pub status: SlotStatus,
}

/// A finished screen
#[derive(Debug, Clone)]
pub struct Composition {
    pub bitmap: Bitmap,
    pub layout: LayoutType,
    pub slots: Vec<SlotReport>,
}

impl Composition {
    pub fn failed_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s.status, SlotStatus::Error(_)))
            .count()
    }
}

/// Assembles screens from a widget registry
#[derive(Clone, Copy)]
pub struct ScreenComposer<'r> {
    registry: &'r WidgetRegistry,
    themes: ThemeEngine,
}

impl ScreenComposer<'static> {
    /// Composer over the built-in widgets
    pub fn new() -> Self {
        Self::with_registry(tinydash_widgets::global_registry())
    }
}

impl Default for ScreenComposer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> ScreenComposer<'r> {
    pub fn with_registry(registry: &'r WidgetRegistry) -> Self {
        Self {
            registry,
            themes: ThemeEngine,
        }
    }

    /// Theme for a screen: its own override, else the device theme
    pub fn theme_for(&self, device_theme: &str, screen: &ScreenConfig) -> &'static Theme {
        self.themes.theme(screen.theme.as_deref().unwrap_or(device_theme))
    }

    /// Number of slots the screen's layout provides, fallback grid included
    pub fn slot_capacity(screen: &ScreenConfig) -> usize {
        screen
            .layout
            .parse::<LayoutType>()
            .unwrap_or(LayoutType::Grid2x2)
            .slot_count(&screen.layout_options)
    }

    /// Slots that will actually be drawn, in index order
    fn drawable_slots(screen: &ScreenConfig, capacity: usize) -> Vec<&SlotConfig> {
        let mut slots: Vec<&SlotConfig> = screen
            .slots
            .iter()
            .filter(|slot| {
                let in_range = slot.index < capacity;
                if !in_range {
                    log::debug!(
                        "Screen '{}': slot {} is outside the {}-slot layout",
                        screen.name,
                        slot.index,
                        capacity
                    );
                }
                in_range && slot.widget_name().is_some()
            })
            .collect();
        slots.sort_by_key(|slot| slot.index);
        slots
    }

    /// Every entity and history series the screen reads
    pub fn dependencies(&self, screen: &ScreenConfig) -> Dependencies {
        let mut deps = Dependencies::default();
        for slot in Self::drawable_slots(screen, Self::slot_capacity(screen)) {
            deps.merge(self.registry.dependencies(slot));
        }
        deps
    }

    /// Render a screen onto a fresh canvas
    pub fn compose(
        &self,
        screen: &ScreenConfig,
        resolution: Resolution,
        theme: &Theme,
        snapshots: &SnapshotSet,
    ) -> Result<Composition, RenderError> {
        let (layout, rects) =
            slot_rects_or_fallback(&screen.layout, resolution, &screen.layout_options);
        let surface = Bitmap::new_surface(resolution.width, resolution.height)?;
        let mut reports = Vec::new();
        {
            let cr = Context::new(&surface)?;
            theme.background.apply_to_cairo(&cr);
            cr.paint()?;

            for slot in Self::drawable_slots(screen, rects.len()) {
                let rect = rects[slot.index];
                let status = self.draw_slot(&cr, screen, slot, rect, theme, snapshots)?;
                reports.push(SlotReport {
                    index: slot.index,
                    rect,
                    status,
                });
            }

            if let Some(border) = theme.canvas_border {
                draw_border(
                    &cr,
                    resolution.width as f64,
                    resolution.height as f64,
                    border,
                    2.0,
                )?;
            }
        }

        Ok(Composition {
            bitmap: Bitmap::from_surface(&surface)?,
            layout,
            slots: reports,
        })
    }

    fn draw_slot(
        &self,
        cr: &Context,
        screen: &ScreenConfig,
        slot: &SlotConfig,
        rect: Rect,
        theme: &Theme,
        snapshots: &SnapshotSet,
    ) -> Result<SlotStatus, RenderError> {
        let inner = inset(rect, theme.slot_gap);
        if inner.is_empty() {
            return Ok(SlotStatus::Placeholder("slot too small".to_string()));
        }
        let (x, y) = (inner.x as f64, inner.y as f64);
        let (w, h) = (inner.width as f64, inner.height as f64);

        let wants_panel = slot
            .widget_name()
            .and_then(|name| self.registry.lookup(name).ok())
            .map(|renderer| renderer.wants_panel())
            .unwrap_or(true);
        if wants_panel && slot.options.bool_or("show_panel", theme.panels_by_default) {
            draw_panel(cr, x, y, w, h, &theme.panel)?;
        }

        let outcome = self.registry.render_slot(
            slot,
            slot.index,
            inner.width as u32,
            inner.height as u32,
            snapshots,
            theme,
        );
        match outcome {
            WidgetRender::Ok(bitmap) => {
                let image = bitmap.to_surface()?;
                cr.save()?;
                cr.set_source_surface(&image, x, y)?;
                cr.paint()?;
                cr.restore()?;
                Ok(SlotStatus::Rendered)
            }
            WidgetRender::Placeholder(reason) => {
                let caption = match &reason {
                    PlaceholderReason::DataUnavailable(id) => id.clone(),
                    PlaceholderReason::Misconfigured(e) => e.to_string(),
                };
                log::debug!("Screen '{}' slot {}: placeholder ({})", screen.name, slot.index, reason);
                draw_placeholder(cr, x, y, w, h, theme.placeholder, PLACEHOLDER_TEXT, Some(&caption), &theme.font_family)?;
                Ok(SlotStatus::Placeholder(reason.to_string()))
            }
            WidgetRender::Error(message) => {
                log::warn!("Screen '{}' slot {}: render failed: {}", screen.name, slot.index, message);
                draw_placeholder(cr, x, y, w, h, theme.placeholder, "!", Some("error"), &theme.font_family)?;
                Ok(SlotStatus::Error(message))
            }
        }
    }
}

/// Shrink a slot rect by half the gap on each side
fn inset(rect: Rect, gap: f64) -> Rect {
    let half = (gap / 2.0).round().max(0.0) as i32;
    Rect::new(
        rect.x + half,
        rect.y + half,
        (rect.width - 2 * half).max(0),
        (rect.height - 2 * half).max(0),
    )
}
