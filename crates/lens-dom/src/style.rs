//! Inline style declarations (`style="..."`).
//!
//! Only the handful of properties the page model understands are interpreted
//! (`left`, `top`, `width`, `height`, `z-index`, `display`, `visibility`,
//! `pointer-events`); everything else is stored and serialized untouched.

use std::fmt;

/// A resolved CSS length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    Px(f32),
    Percent(f32),
}

impl Length {
    pub fn parse(value: &str) -> Option<Length> {
        let v = value.trim();
        if let Some(num) = v.strip_suffix("px") {
            return num.trim().parse::<f32>().ok().map(Length::Px);
        }
        if let Some(num) = v.strip_suffix('%') {
            return num.trim().parse::<f32>().ok().map(Length::Percent);
        }
        // Unitless zero and bare numbers are treated as pixels.
        v.parse::<f32>().ok().map(Length::Px)
    }

    /// Resolve against the containing dimension (the viewport for this model).
    pub fn resolve(self, basis: f32) -> f32 {
        match self {
            Length::Px(px) => px,
            Length::Percent(pct) => basis * pct / 100.0,
        }
    }
}

/// Ordered list of `property: value` declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `style` attribute. Malformed declarations are skipped.
    pub fn parse(css: &str) -> Self {
        let mut style = Self::new();
        for decl in css.split(';') {
            let Some((name, value)) = decl.split_once(':') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            style.set(name, value);
        }
        style
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        let property = property.to_ascii_lowercase();
        self.declarations
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Set a declaration, replacing an existing one in place.
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let property = property.to_ascii_lowercase();
        let value = value.into();
        match self.declarations.iter_mut().find(|(name, _)| *name == property) {
            Some(slot) => slot.1 = value,
            None => self.declarations.push((property, value)),
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let property = property.to_ascii_lowercase();
        let idx = self.declarations.iter().position(|(name, _)| *name == property)?;
        Some(self.declarations.remove(idx).1)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn length(&self, property: &str) -> Option<Length> {
        self.get(property).and_then(Length::parse)
    }

    pub fn z_index(&self) -> i32 {
        self.get("z-index")
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(0)
    }

    pub fn is_display_none(&self) -> bool {
        self.get("display").is_some_and(|v| v.eq_ignore_ascii_case("none"))
    }

    /// `Some(true)` for `visible`, `Some(false)` for `hidden`/`collapse`, `None` to inherit.
    pub fn visibility(&self) -> Option<bool> {
        match self.get("visibility")?.to_ascii_lowercase().as_str() {
            "visible" => Some(true),
            "hidden" | "collapse" => Some(false),
            _ => None,
        }
    }

    /// `Some(false)` for `pointer-events: none`, `Some(true)` for any other explicit value.
    pub fn pointer_events(&self) -> Option<bool> {
        self.get("pointer-events")
            .map(|v| !v.eq_ignore_ascii_case("none"))
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}: {value};")?;
        }
        Ok(())
    }
}
