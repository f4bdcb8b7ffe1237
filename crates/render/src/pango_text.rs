//! Pango-based text rendering
//!
//! Cairo's toy font API keeps growing internal font caches and cannot shape
//! anything beyond Latin text. All widget text goes through Pango instead.
//! FontDescriptions are cached per thread since every render pass asks for
//! the same handful of family/size combinations.

use cairo::Context;
use pango::{FontDescription, Weight as PangoWeight};
use pangocairo::functions::{create_layout, show_layout};
use std::cell::RefCell;
use std::collections::HashMap;
use tinydash_types::Color;

/// Text extents in pixels (logical box, which includes line spacing)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextExtents {
    pub width: f64,
    pub height: f64,
    /// Distance from the top of the logical box to the baseline
    pub baseline: f64,
}

/// Font request: family, size in points, weight
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f64,
    pub bold: bool,
}

impl Font {
    pub fn new(family: &str, size: f64) -> Self {
        Self {
            family: family.to_string(),
            size,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn sized(&self, size: f64) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}

/// Horizontal anchoring of text relative to its x coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl HAlign {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "left" | "start" => HAlign::Left,
            "right" | "end" => HAlign::Right,
            _ => HAlign::Center,
        }
    }
}

/// Vertical anchoring of text relative to its y coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Cache for FontDescription objects to avoid repeated allocations
struct FontDescriptionCache {
    cache: HashMap<FontKey, FontDescription>,
    max_entries: usize,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct FontKey {
    family: String,
    bold: bool,
    size_pango: i32, // Size in Pango units (points * PANGO_SCALE)
}

impl FontDescriptionCache {
    fn new() -> Self {
        Self {
            cache: HashMap::new(),
            max_entries: 64,
        }
    }

    fn get_or_create(&mut self, font: &Font) -> FontDescription {
        let size_pango = (font.size.max(1.0) * pango::SCALE as f64) as i32;
        let key = FontKey {
            family: font.family.clone(),
            bold: font.bold,
            size_pango,
        };

        if let Some(desc) = self.cache.get(&key) {
            return desc.clone();
        }

        // Evict if full (simple eviction - just clear half)
        if self.cache.len() >= self.max_entries {
            let keys_to_remove: Vec<_> = self
                .cache
                .keys()
                .take(self.max_entries / 2)
                .cloned()
                .collect();
            for k in keys_to_remove {
                self.cache.remove(&k);
            }
        }

        let mut desc = FontDescription::new();
        desc.set_family(&font.family);
        desc.set_weight(if font.bold {
            PangoWeight::Bold
        } else {
            PangoWeight::Normal
        });
        // Absolute size so text scales with pixels, not the surface's DPI
        desc.set_absolute_size(size_pango as f64);

        self.cache.insert(key, desc.clone());
        desc
    }
}

thread_local! {
    static FONT_DESC_CACHE: RefCell<FontDescriptionCache> = RefCell::new(FontDescriptionCache::new());
}

fn layout_for(cr: &Context, text: &str, font: &Font) -> pango::Layout {
    let desc = FONT_DESC_CACHE.with(|cache| cache.borrow_mut().get_or_create(font));
    let layout = create_layout(cr);
    layout.set_font_description(Some(&desc));
    layout.set_text(text);
    layout
}

/// Measure text with Pango
pub fn text_extents(cr: &Context, text: &str, font: &Font) -> TextExtents {
    let layout = layout_for(cr, text, font);
    let (_ink, logical) = layout.extents();
    let scale = pango::SCALE as f64;
    TextExtents {
        width: logical.width() as f64 / scale,
        height: logical.height() as f64 / scale,
        baseline: layout.baseline() as f64 / scale,
    }
}

/// Draw text anchored at (x, y) and return its extents.
///
/// `halign`/`valign` say which part of the text's logical box lands on the
/// anchor point.
pub fn draw_text(
    cr: &Context,
    text: &str,
    font: &Font,
    color: Color,
    x: f64,
    y: f64,
    halign: HAlign,
    valign: VAlign,
) -> Result<TextExtents, cairo::Error> {
    let layout = layout_for(cr, text, font);
    let (_ink, logical) = layout.extents();
    let scale = pango::SCALE as f64;
    let extents = TextExtents {
        width: logical.width() as f64 / scale,
        height: logical.height() as f64 / scale,
        baseline: layout.baseline() as f64 / scale,
    };

    let left = match halign {
        HAlign::Left => x,
        HAlign::Center => x - extents.width / 2.0,
        HAlign::Right => x - extents.width,
    };
    let top = match valign {
        VAlign::Top => y,
        VAlign::Middle => y - extents.height / 2.0,
        VAlign::Bottom => y - extents.height,
    };

    cr.save()?;
    color.apply_to_cairo(cr);
    cr.move_to(left, top);
    show_layout(cr, &layout);
    cr.restore()?;
    Ok(extents)
}

/// Largest size (not above `max_size`) at which `text` fits in the box
pub fn fit_font_size(
    cr: &Context,
    text: &str,
    font: &Font,
    max_width: f64,
    max_height: f64,
    max_size: f64,
) -> f64 {
    let min_size = 6.0;
    let mut size = max_size.max(min_size);
    while size > min_size {
        let extents = text_extents(cr, text, &font.sized(size));
        if extents.width <= max_width && extents.height <= max_height {
            return size;
        }
        // Shrink proportionally, at least one point per step
        let ratio = (max_width / extents.width.max(1.0))
            .min(max_height / extents.height.max(1.0))
            .min(1.0);
        size = (size * ratio).min(size - 1.0).floor().max(min_size);
    }
    min_size
}

/// Drop characters from the end until `text` fits `max_width`, appending ".."
pub fn truncate_to_width(cr: &Context, text: &str, font: &Font, max_width: f64) -> String {
    if text_extents(cr, text, font).width <= max_width {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut keep = chars.len();
    while keep > 0 {
        keep -= 1;
        let candidate: String = chars[..keep].iter().collect::<String>() + "..";
        if text_extents(cr, &candidate, font).width <= max_width {
            return candidate;
        }
    }
    String::new()
}
