/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Brighten a color by a factor (1.0 = no change, >1.0 = brighter).
pub fn brighten(r: u8, g: u8, b: u8, factor: f64) -> (u8, u8, u8) {
    (
        ((r as f64 * factor).min(255.0)) as u8,
        ((g as f64 * factor).min(255.0)) as u8,
        ((b as f64 * factor).min(255.0)) as u8,
    )
}

pub type Rgb = (u8, u8, u8);

/// Colour scheme selected by the server (or at random on first load).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Blue,
    Amber,
    Green,
    Red,
    Purple,
}

/// Semantic colours a theme resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: Rgb,
    pub success: Rgb,
    pub warning: Rgb,
    pub background: Rgb,
    pub text: Rgb,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Blue,
        Theme::Amber,
        Theme::Green,
        Theme::Red,
        Theme::Purple,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "blue" => Some(Self::Blue),
            "amber" => Some(Self::Amber),
            "green" => Some(Self::Green),
            "red" => Some(Self::Red),
            "purple" => Some(Self::Purple),
            _ => None,
        }
    }

    /// Pick a theme from a uniform sample in `[0, 1)`.
    pub fn from_unit(sample: f64) -> Self {
        let idx = (sample.clamp(0.0, 0.999_999) * Self::ALL.len() as f64) as usize;
        Self::ALL[idx]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Amber => "amber",
            Self::Green => "green",
            Self::Red => "red",
            Self::Purple => "purple",
        }
    }

    pub fn body_class(self) -> String {
        format!("theme-{}", self.name())
    }

    pub const fn palette(self) -> Palette {
        match self {
            Self::Blue => Palette {
                primary: (0x00, 0xa8, 0xff),
                success: (0x00, 0xff, 0x88),
                warning: (0xff, 0x88, 0x00),
                background: (0x05, 0x0a, 0x14),
                text: (0xc8, 0xe6, 0xff),
            },
            Self::Amber => Palette {
                primary: (0xff, 0xb0, 0x00),
                success: (0x9a, 0xcd, 0x32),
                warning: (0xff, 0x6a, 0x00),
                background: (0x14, 0x0c, 0x02),
                text: (0xff, 0xe4, 0xb5),
            },
            Self::Green => Palette {
                primary: (0x00, 0xff, 0x41),
                success: (0x7f, 0xff, 0xd4),
                warning: (0xff, 0xd7, 0x00),
                background: (0x02, 0x10, 0x06),
                text: (0xc0, 0xff, 0xc8),
            },
            Self::Red => Palette {
                primary: (0xff, 0x33, 0x33),
                success: (0x66, 0xcc, 0x66),
                warning: (0xff, 0xa5, 0x00),
                background: (0x14, 0x04, 0x04),
                text: (0xff, 0xd0, 0xd0),
            },
            Self::Purple => Palette {
                primary: (0xb0, 0x6b, 0xff),
                success: (0x5c, 0xe1, 0xe6),
                warning: (0xff, 0x8c, 0x42),
                background: (0x0c, 0x05, 0x16),
                text: (0xe6, 0xd5, 0xff),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_names_roundtrip() {
        for theme in Theme::ALL {
            assert_eq!(Theme::parse(theme.name()), Some(theme));
        }
        assert_eq!(Theme::parse(" Amber "), Some(Theme::Amber));
        assert_eq!(Theme::parse("teal"), None);
        assert_eq!(Theme::Red.body_class(), "theme-red");
    }

    #[test]
    fn unit_sample_covers_every_theme() {
        assert_eq!(Theme::from_unit(0.0), Theme::Blue);
        assert_eq!(Theme::from_unit(0.5), Theme::Green);
        assert_eq!(Theme::from_unit(0.999), Theme::Purple);
        assert_eq!(Theme::from_unit(1.0), Theme::Purple);
    }

    #[test]
    fn brighten_saturates() {
        assert_eq!(brighten(200, 100, 0, 2.0), (255, 200, 0));
        assert_eq!(rgba_css(1, 2, 3, 0.5), "rgba(1,2,3,0.5)");
    }
}
