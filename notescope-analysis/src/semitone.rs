//! The twelve equal-tempered pitch classes and their fixed lookups
//!
//! Reference frequencies are the octave-0 fundamentals (C0 = 16.35 Hz).
//! Display styles are the colour/linestyle pairs used for overlay lines.

use std::fmt;

/// One of the 12 pitch classes, in ascending order from C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semitone {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl Semitone {
    /// All semitones in canonical order
    pub const ALL: [Semitone; 12] = [
        Semitone::C,
        Semitone::CSharp,
        Semitone::D,
        Semitone::DSharp,
        Semitone::E,
        Semitone::F,
        Semitone::FSharp,
        Semitone::G,
        Semitone::GSharp,
        Semitone::A,
        Semitone::ASharp,
        Semitone::B,
    ];

    /// Pitch class index (0-11, where 0=C)
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// ASCII label used in note labels ("Cs" rather than "C♯")
    pub fn label(&self) -> &'static str {
        use Semitone::*;
        match self {
            C => "C",
            CSharp => "Cs",
            D => "D",
            DSharp => "Ds",
            E => "E",
            F => "F",
            FSharp => "Fs",
            G => "G",
            GSharp => "Gs",
            A => "A",
            ASharp => "As",
            B => "B",
        }
    }

    /// Parse a semitone name
    ///
    /// Accepts the ASCII label ("Cs"), and the "C#" / "C♯" spellings.
    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim();
        let (letter, rest) = s.split_at(s.char_indices().nth(1).map_or(s.len(), |(i, _)| i));
        let sharp = match rest {
            "" => false,
            "s" | "#" | "♯" => true,
            _ => return None,
        };

        use Semitone::*;
        let semitone = match (letter.to_ascii_uppercase().as_str(), sharp) {
            ("C", false) => C,
            ("C", true) => CSharp,
            ("D", false) => D,
            ("D", true) => DSharp,
            ("E", false) => E,
            ("F", false) => F,
            ("F", true) => FSharp,
            ("G", false) => G,
            ("G", true) => GSharp,
            ("A", false) => A,
            ("A", true) => ASharp,
            ("B", false) => B,
            _ => return None,
        };
        Some(semitone)
    }

    /// Octave-0 reference frequency in Hz
    pub fn fundamental_hz(&self) -> f64 {
        use Semitone::*;
        match self {
            C => 16.35,
            CSharp => 17.32,
            D => 18.35,
            DSharp => 19.45,
            E => 20.6,
            F => 21.83,
            FSharp => 23.12,
            G => 24.5,
            GSharp => 25.96,
            A => 27.5,
            ASharp => 29.14,
            B => 30.87,
        }
    }

    /// Display style used when drawing a line at this note's frequency
    pub fn style(&self) -> NoteStyle {
        use Color::*;
        use LineStyle::*;
        use Semitone::*;
        let (color, linestyle) = match self {
            C => (Red, Solid),
            CSharp => (Red, Dashed),
            D => (Yellow, Solid),
            // Shares C♯'s colour rather than D's yellow
            DSharp => (Red, Dashed),
            E => (Green, Solid),
            F => (Cyan, Solid),
            FSharp => (Cyan, Dashed),
            G => (Blue, Solid),
            GSharp => (Blue, Dashed),
            A => (Magenta, Solid),
            ASharp => (Magenta, Dashed),
            B => (White, Solid),
        };
        NoteStyle { color, linestyle }
    }
}

impl fmt::Display for Semitone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Semitone::*;
        let name = match self {
            C => "C",
            CSharp => "C♯",
            D => "D",
            DSharp => "D♯",
            E => "E",
            F => "F",
            FSharp => "F♯",
            G => "G",
            GSharp => "G♯",
            A => "A",
            ASharp => "A♯",
            B => "B",
        };
        write!(f, "{}", name)
    }
}

/// Line colour for a note overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Yellow,
    Green,
    Cyan,
    Blue,
    Magenta,
    White,
}

impl Color {
    /// Single-character plotting code
    pub fn code(&self) -> char {
        match self {
            Color::Red => 'r',
            Color::Yellow => 'y',
            Color::Green => 'g',
            Color::Cyan => 'c',
            Color::Blue => 'b',
            Color::Magenta => 'm',
            Color::White => 'w',
        }
    }
}

/// Line pattern for a note overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineStyle {
    Solid,
    Dashed,
}

impl LineStyle {
    /// Plotting code ("-" or "--")
    pub fn code(&self) -> &'static str {
        match self {
            LineStyle::Solid => "-",
            LineStyle::Dashed => "--",
        }
    }
}

/// Display metadata attached to a styled note entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteStyle {
    pub color: Color,
    pub linestyle: LineStyle,
}

/// A set of semitones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteSet {
    bits: u16,
}

impl Default for NoteSet {
    fn default() -> Self {
        Self::all()
    }
}

impl NoteSet {
    const FULL: u16 = (1 << 12) - 1;

    /// Every semitone
    pub fn all() -> Self {
        Self { bits: Self::FULL }
    }

    /// No semitones
    pub fn empty() -> Self {
        Self { bits: 0 }
    }

    /// The natural notes of C major
    pub fn c_major() -> Self {
        use Semitone::*;
        [C, D, E, F, G, A, B].into_iter().collect()
    }

    pub fn insert(&mut self, semitone: Semitone) {
        self.bits |= 1 << semitone.index();
    }

    pub fn contains(&self, semitone: Semitone) -> bool {
        self.bits & (1 << semitone.index()) != 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Members in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Semitone> + '_ {
        Semitone::ALL.into_iter().filter(|s| self.contains(*s))
    }
}

impl FromIterator<Semitone> for NoteSet {
    fn from_iter<I: IntoIterator<Item = Semitone>>(iter: I) -> Self {
        let mut set = NoteSet::empty();
        for semitone in iter {
            set.insert(semitone);
        }
        set
    }
}

/// Octave-0 fundamentals for all 12 semitones, multiplied by `scale`
pub fn fundamental_frequencies(scale: f64) -> [(Semitone, f64); 12] {
    Semitone::ALL.map(|s| (s, s.fundamental_hz() * scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_order() {
        for (i, s) in Semitone::ALL.iter().enumerate() {
            assert_eq!(s.index() as usize, i);
        }
        assert_eq!(Semitone::B.index(), 11);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Semitone::CSharp.label(), "Cs");
        assert_eq!(Semitone::A.label(), "A");
        assert_eq!(Semitone::FSharp.to_string(), "F♯");
    }

    #[test]
    fn test_from_label_spellings() {
        assert_eq!(Semitone::from_label("Cs"), Some(Semitone::CSharp));
        assert_eq!(Semitone::from_label("C#"), Some(Semitone::CSharp));
        assert_eq!(Semitone::from_label("C♯"), Some(Semitone::CSharp));
        assert_eq!(Semitone::from_label("a"), Some(Semitone::A));
        assert_eq!(Semitone::from_label(" G "), Some(Semitone::G));
        assert_eq!(Semitone::from_label("Es"), None);
        assert_eq!(Semitone::from_label("H"), None);
        assert_eq!(Semitone::from_label(""), None);
        assert_eq!(Semitone::from_label("Cb"), None);
    }

    #[test]
    fn test_fundamentals_ascending() {
        for pair in Semitone::ALL.windows(2) {
            assert!(pair[0].fundamental_hz() < pair[1].fundamental_hz());
        }
        assert_eq!(Semitone::C.fundamental_hz(), 16.35);
        assert_eq!(Semitone::A.fundamental_hz(), 27.5);
    }

    #[test]
    fn test_style_lookup() {
        let style = Semitone::C.style();
        assert_eq!(style.color.code(), 'r');
        assert_eq!(style.linestyle.code(), "-");

        let style = Semitone::DSharp.style();
        assert_eq!(style.color, Color::Red);
        assert_eq!(style.linestyle, LineStyle::Dashed);

        assert_eq!(Semitone::B.style().color.code(), 'w');
    }

    #[test]
    fn test_note_set() {
        let all = NoteSet::all();
        assert_eq!(all.len(), 12);
        assert!(NoteSet::empty().is_empty());

        let major = NoteSet::c_major();
        assert_eq!(major.len(), 7);
        assert!(major.contains(Semitone::E));
        assert!(!major.contains(Semitone::FSharp));

        let mut set = NoteSet::empty();
        set.insert(Semitone::A);
        set.insert(Semitone::C);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Semitone::C, Semitone::A]);
        set.insert(Semitone::A);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_fundamental_frequencies_scaled() {
        let freqs = fundamental_frequencies(2.0);
        assert_eq!(freqs[0], (Semitone::C, 32.7));
        assert_eq!(freqs[9], (Semitone::A, 55.0));
    }
}
