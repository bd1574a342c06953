use super::Color;
use std::collections::HashSet;

/// The distinct colors of a reference image. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    colors: HashSet<Color>,
}

impl Palette {
    pub fn new(colors: HashSet<Color>) -> Self {
        Self { colors }
    }

    pub fn contains(&self, color: &Color) -> bool {
        self.colors.contains(color)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.colors.iter()
    }
}

impl FromIterator<Color> for Palette {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
