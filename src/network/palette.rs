use std::collections::HashMap;

use serde::Serialize;

use crate::util::stable_hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Language → node color table, owned by whoever builds the network.
///
/// Languages missing from the table get a color derived from a hash of the
/// name, so the same language is always drawn the same way.
#[derive(Clone, Debug)]
pub struct LanguagePalette {
    colors: HashMap<String, Rgb>,
    unknown: Rgb,
}

impl LanguagePalette {
    pub fn new(unknown: Rgb) -> Self {
        Self {
            colors: HashMap::new(),
            unknown,
        }
    }

    pub fn with_color(mut self, language: &str, color: Rgb) -> Self {
        self.colors.insert(language.to_owned(), color);
        self
    }

    pub fn github_defaults() -> Self {
        [
            ("Rust", Rgb(222, 165, 132)),
            ("TypeScript", Rgb(49, 120, 198)),
            ("JavaScript", Rgb(241, 224, 90)),
            ("Python", Rgb(53, 114, 165)),
            ("Go", Rgb(0, 173, 216)),
            ("Java", Rgb(176, 114, 25)),
            ("C", Rgb(85, 85, 85)),
            ("C++", Rgb(243, 75, 125)),
            ("C#", Rgb(23, 134, 0)),
            ("Ruby", Rgb(112, 21, 22)),
            ("Shell", Rgb(137, 224, 81)),
            ("Nix", Rgb(126, 126, 255)),
            ("HTML", Rgb(227, 76, 38)),
            ("CSS", Rgb(86, 61, 124)),
            ("Kotlin", Rgb(169, 123, 255)),
            ("Swift", Rgb(240, 81, 56)),
            ("Lua", Rgb(0, 0, 128)),
            ("Haskell", Rgb(94, 80, 134)),
        ]
        .into_iter()
        .fold(Self::new(Rgb(139, 148, 158)), |palette, (language, color)| {
            palette.with_color(language, color)
        })
    }

    pub fn color_for(&self, language: Option<&str>) -> Rgb {
        match language {
            None => self.unknown,
            Some(language) => self
                .colors
                .get(language)
                .copied()
                .unwrap_or_else(|| hashed_color(language)),
        }
    }
}

fn hashed_color(language: &str) -> Rgb {
    let hue = (stable_hash(language) % 360) as f32;
    hsl_to_rgb(hue, 0.55, 0.6)
}

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let channel = |value: f32| ((value + m).clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb(channel(r), channel(g), channel(b))
}
