//! Theme system for syntax highlighting.
//!
//! Maps capture names to rendering attributes. Lookups walk the capture's
//! fallback chain, so a theme only needs rules for the broad categories.

use super::capture::CaptureName;
use std::collections::HashMap;

/// RGBA color represented as [r, g, b, a] with values 0.0-1.0.
pub type Color = [f32; 4];

/// Font traits applied on top of the color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl FontStyle {
    pub const PLAIN: FontStyle = FontStyle {
        bold: false,
        italic: false,
        underline: false,
    };
    pub const BOLD: FontStyle = FontStyle {
        bold: true,
        ..FontStyle::PLAIN
    };
    pub const ITALIC: FontStyle = FontStyle {
        italic: true,
        ..FontStyle::PLAIN
    };
    pub const UNDERLINE: FontStyle = FontStyle {
        underline: true,
        ..FontStyle::PLAIN
    };
}

/// The attributes the host applies to a range of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeSet {
    pub foreground: Color,
    pub font: FontStyle,
}

/// A syntax highlighting theme.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Theme name.
    pub name: String,
    /// Background color.
    pub background: Color,
    /// Default text color.
    pub foreground: Color,
    colors: HashMap<CaptureName, Color>,
    fonts: HashMap<CaptureName, FontStyle>,
}

impl Theme {
    /// Creates a new theme with the given name and default colors.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            background: [0.102, 0.102, 0.122, 1.0], // #1A1A1F
            foreground: [0.902, 0.902, 0.902, 1.0], // #E6E6E6
            colors: HashMap::new(),
            fonts: HashMap::new(),
        }
    }

    /// Sets the color for a capture.
    pub fn set_color(&mut self, capture: CaptureName, color: Color) {
        self.colors.insert(capture, color);
    }

    /// Sets the font traits for a capture.
    pub fn set_font_style(&mut self, capture: CaptureName, font: FontStyle) {
        self.fonts.insert(capture, font);
    }

    /// Gets the color for a capture, walking its fallback chain, then the
    /// theme foreground.
    pub fn color_for(&self, capture: Option<CaptureName>) -> Color {
        capture
            .and_then(|capture| {
                capture
                    .fallback_chain()
                    .find_map(|c| self.colors.get(&c).copied())
            })
            .unwrap_or(self.foreground)
    }

    /// Gets the font traits for a capture, walking its fallback chain.
    pub fn font_for(&self, capture: Option<CaptureName>) -> FontStyle {
        capture
            .and_then(|capture| {
                capture
                    .fallback_chain()
                    .find_map(|c| self.fonts.get(&c).copied())
            })
            .unwrap_or_default()
    }

    /// Gets the full attribute set for a capture. `None` means unhighlighted text.
    pub fn attributes_for(&self, capture: Option<CaptureName>) -> AttributeSet {
        AttributeSet {
            foreground: self.color_for(capture),
            font: self.font_for(capture),
        }
    }

    /// Attributes for text with no capture.
    pub fn default_attributes(&self) -> AttributeSet {
        self.attributes_for(None)
    }

    /// Creates the default dark theme (similar to One Dark).
    pub fn dark() -> Self {
        let mut theme = Self::new("Dark");

        // One Dark inspired colors
        theme.background = [0.102, 0.102, 0.122, 1.0]; // #1A1A1F
        theme.foreground = [0.682, 0.710, 0.749, 1.0]; // #ABB2BF

        // Keywords - purple/magenta
        theme.set_color(CaptureName::Keyword, [0.769, 0.471, 0.839, 1.0]); // #C477D6

        // Strings - green
        theme.set_color(CaptureName::String, [0.596, 0.765, 0.475, 1.0]); // #98C379
        theme.set_color(CaptureName::Escape, [0.337, 0.788, 0.784, 1.0]); // #56C9C8

        // Numbers - orange
        theme.set_color(CaptureName::Number, [0.824, 0.608, 0.467, 1.0]); // #D29B77
        theme.set_color(CaptureName::Constant, [0.824, 0.608, 0.467, 1.0]); // #D29B77

        // Comments - gray
        theme.set_color(CaptureName::Comment, [0.455, 0.506, 0.557, 1.0]); // #74818E
        theme.set_font_style(CaptureName::Comment, FontStyle::ITALIC);

        // Functions - blue
        theme.set_color(CaptureName::Function, [0.380, 0.686, 0.937, 1.0]); // #61AFEF
        theme.set_color(CaptureName::FunctionMacro, [0.337, 0.788, 0.784, 1.0]); // #56C9C8

        // Types - yellow/gold
        theme.set_color(CaptureName::Type, [0.890, 0.780, 0.478, 1.0]); // #E3C77A
        theme.set_color(CaptureName::Namespace, [0.890, 0.780, 0.478, 1.0]); // #E3C77A
        theme.set_color(CaptureName::Attribute, [0.890, 0.780, 0.478, 1.0]); // #E3C77A

        // Variables - red/coral
        theme.set_color(CaptureName::VariableBuiltin, [0.878, 0.439, 0.439, 1.0]); // #E07070
        theme.set_color(CaptureName::VariableParameter, [0.878, 0.439, 0.439, 1.0]); // #E07070
        theme.set_font_style(CaptureName::VariableParameter, FontStyle::ITALIC);
        theme.set_color(CaptureName::Property, [0.878, 0.439, 0.439, 1.0]); // #E07070
        theme.set_color(CaptureName::Tag, [0.878, 0.439, 0.439, 1.0]); // #E07070

        // Operators and punctuation
        theme.set_color(CaptureName::Operator, [0.337, 0.788, 0.784, 1.0]); // #56C9C8
        theme.set_color(CaptureName::Punctuation, [0.600, 0.627, 0.667, 1.0]); // #99A0AA

        // Markup
        theme.set_color(CaptureName::Title, [0.769, 0.471, 0.839, 1.0]); // #C477D6
        theme.set_font_style(CaptureName::Title, FontStyle::BOLD);
        theme.set_font_style(CaptureName::Bold, FontStyle::BOLD);
        theme.set_font_style(CaptureName::Italic, FontStyle::ITALIC);
        theme.set_color(CaptureName::Uri, [0.380, 0.686, 0.937, 1.0]); // #61AFEF
        theme.set_font_style(CaptureName::Uri, FontStyle::UNDERLINE);

        // Errors
        theme.set_color(CaptureName::Error, [0.878, 0.298, 0.298, 1.0]); // #E04C4C
        theme.set_font_style(CaptureName::Error, FontStyle::UNDERLINE);

        theme
    }

    /// Creates a light theme.
    pub fn light() -> Self {
        let mut theme = Self::new("Light");

        theme.background = [0.984, 0.984, 0.984, 1.0]; // #FBFBFB
        theme.foreground = [0.231, 0.259, 0.322, 1.0]; // #3B4252

        // Keywords - purple
        theme.set_color(CaptureName::Keyword, [0.627, 0.314, 0.706, 1.0]); // #A050B4

        // Strings - green
        theme.set_color(CaptureName::String, [0.306, 0.604, 0.024, 1.0]); // #4E9A06

        // Numbers - blue
        theme.set_color(CaptureName::Number, [0.114, 0.404, 0.804, 1.0]); // #1D67CD
        theme.set_color(CaptureName::Constant, [0.114, 0.404, 0.804, 1.0]); // #1D67CD

        // Comments - gray
        theme.set_color(CaptureName::Comment, [0.502, 0.549, 0.596, 1.0]); // #808C98
        theme.set_font_style(CaptureName::Comment, FontStyle::ITALIC);

        // Functions - blue
        theme.set_color(CaptureName::Function, [0.071, 0.345, 0.667, 1.0]); // #1258AA

        // Types - teal
        theme.set_color(CaptureName::Type, [0.016, 0.490, 0.490, 1.0]); // #047D7D

        // Variables - dark red
        theme.set_color(CaptureName::VariableBuiltin, [0.753, 0.204, 0.204, 1.0]); // #C03434
        theme.set_color(CaptureName::Property, [0.753, 0.204, 0.204, 1.0]); // #C03434

        theme
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
