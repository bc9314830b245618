//! Phrase tables for rule labels
//!
//! Pure data: the synthesizer in [`super::label`] only walks these tables, so
//! a different [`PhraseBook`] (another language, another desktop) can be
//! swapped in without touching matching or migration. The curated entries are
//! not meant to be exhaustive; anything they miss falls through to the
//! property templates and finally to `<property>:<value> excluded`.

use super::schema::{Criterion, FilterValue, Property};

/// Constant counterpart of [`FilterValue`] usable in static tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Text(&'static str),
    Integer(i64),
    Flag(bool),
}

impl Literal {
    pub fn matches(&self, value: &FilterValue) -> bool {
        match (self, value) {
            (Literal::Text(a), FilterValue::Text(b)) => *a == b.as_str(),
            (Literal::Integer(a), FilterValue::Integer(b)) => a == b,
            (Literal::Flag(a), FilterValue::Flag(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Literal> for FilterValue {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Text(s) => FilterValue::Text(s.to_string()),
            Literal::Integer(i) => FilterValue::Integer(i),
            Literal::Flag(b) => FilterValue::Flag(b),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CriterionPattern {
    pub property: Property,
    pub value: Literal,
}

impl CriterionPattern {
    pub const fn new(property: Property, value: Literal) -> Self {
        Self { property, value }
    }

    pub fn matches(&self, criterion: &Criterion) -> bool {
        criterion.property() == self.property && self.value.matches(criterion.value())
    }
}

/// Curated label for a body containing all of `requires`, in any order
#[derive(Debug, Clone, Copy)]
pub struct CompositePhrase {
    pub requires: &'static [CriterionPattern],
    pub phrase: &'static str,
}

impl CompositePhrase {
    pub fn matches(&self, body: &[Criterion]) -> bool {
        self.requires
            .iter()
            .all(|pattern| body.iter().any(|c| pattern.matches(c)))
    }
}

/// Description of the second condition in an `ownerName` + one-other body
#[derive(Debug, Clone, Copy)]
pub struct OwnerPairPhrase {
    pub pattern: CriterionPattern,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub enum Template {
    /// `{value}` is replaced with the criterion value
    Interpolate(&'static str),
    Flag { on: &'static str, off: &'static str },
}

impl Template {
    pub fn render(&self, value: &FilterValue) -> Option<String> {
        match (self, value) {
            (Template::Interpolate(pattern), value) => {
                Some(pattern.replace("{value}", &value.to_string()))
            }
            (Template::Flag { on, .. }, FilterValue::Flag(true)) => Some(on.to_string()),
            (Template::Flag { off, .. }, FilterValue::Flag(false)) => Some(off.to_string()),
            (Template::Flag { .. }, _) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PhraseBook {
    pub owner_names: &'static [(&'static str, &'static str)],
    pub window_names: &'static [(&'static str, &'static str)],
    pub templates: &'static [(Property, Template)],
    /// Checked in order, first match wins
    pub composites: &'static [CompositePhrase],
    pub owner_pairs: &'static [OwnerPairPhrase],
}

impl PhraseBook {
    pub fn owner_phrase(&self, owner: &str) -> Option<&'static str> {
        lookup(self.owner_names, owner)
    }

    pub fn window_phrase(&self, title: &str) -> Option<&'static str> {
        lookup(self.window_names, title)
    }

    pub fn template(&self, property: Property) -> Option<&Template> {
        self.templates
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, template)| template)
    }

    pub fn composite(&self, body: &[Criterion]) -> Option<&'static str> {
        self.composites
            .iter()
            .find(|composite| composite.matches(body))
            .map(|composite| composite.phrase)
    }

    pub fn owner_pair(&self, criterion: &Criterion) -> Option<&'static str> {
        self.owner_pairs
            .iter()
            .find(|pair| pair.pattern.matches(criterion))
            .map(|pair| pair.description)
    }
}

impl Default for PhraseBook {
    fn default() -> Self {
        DEFAULT
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, phrase)| *phrase)
}

const OWNER_NAMES: &[(&str, &str)] = &[
    ("Dock", "Dock excluded"),
    ("Window Server", "Window Server excluded"),
    ("SystemUIServer", "menu bar extras excluded"),
    ("Control Center", "Control Center excluded"),
    ("Notification Center", "Notification Center excluded"),
    ("Spotlight", "Spotlight excluded"),
    ("loginwindow", "login window excluded"),
    ("Finder", "Finder windows excluded"),
    ("plasmashell", "Plasma shell excluded"),
    ("Xfce4-panel", "Xfce panel excluded"),
    ("Polybar", "Polybar excluded"),
    ("Dunst", "notification popups excluded"),
    ("Conky", "Conky excluded"),
];

const WINDOW_NAMES: &[(&str, &str)] = &[
    ("", "untitled windows excluded"),
    ("Menubar", "menu bar excluded"),
    ("Desktop", "desktop excluded"),
    ("Focus Proxy", "focus proxy windows excluded"),
    ("Item-0", "status items excluded"),
];

const TEMPLATES: &[(Property, Template)] = &[
    (Property::OwnerName, Template::Interpolate("{value} windows excluded")),
    (Property::WindowName, Template::Interpolate("windows titled \"{value}\" excluded")),
    (Property::OwnerPid, Template::Interpolate("process {value} excluded")),
    (Property::WindowNumber, Template::Interpolate("window #{value} excluded")),
    (Property::WindowLayer, Template::Interpolate("layer {value} windows excluded")),
    (Property::MemoryUsage, Template::Interpolate("windows using {value} bytes excluded")),
    (
        Property::IsOnscreen,
        Template::Flag {
            on: "onscreen windows excluded",
            off: "offscreen windows excluded",
        },
    ),
    (Property::X, Template::Interpolate("windows at x={value} excluded")),
    (Property::Y, Template::Interpolate("windows at y={value} excluded")),
    (Property::Width, Template::Interpolate("{value}px wide windows excluded")),
    (Property::Height, Template::Interpolate("{value}px tall windows excluded")),
];

const COMPOSITES: &[CompositePhrase] = &[
    CompositePhrase {
        requires: &[
            CriterionPattern::new(Property::OwnerName, Literal::Text("Finder")),
            CriterionPattern::new(Property::WindowName, Literal::Text("")),
        ],
        phrase: "empty Finder windows excluded",
    },
    CompositePhrase {
        requires: &[
            CriterionPattern::new(Property::OwnerName, Literal::Text("Window Server")),
            CriterionPattern::new(Property::WindowName, Literal::Text("Menubar")),
        ],
        phrase: "menu bar excluded",
    },
    CompositePhrase {
        requires: &[
            CriterionPattern::new(Property::OwnerName, Literal::Text("Control Center")),
            CriterionPattern::new(Property::WindowName, Literal::Text("")),
        ],
        phrase: "Control Center panels excluded",
    },
    CompositePhrase {
        requires: &[
            CriterionPattern::new(Property::OwnerName, Literal::Text("plasmashell")),
            CriterionPattern::new(Property::WindowName, Literal::Text("Desktop")),
        ],
        phrase: "Plasma desktop excluded",
    },
];

const OWNER_PAIRS: &[OwnerPairPhrase] = &[
    OwnerPairPhrase {
        pattern: CriterionPattern::new(Property::IsOnscreen, Literal::Flag(false)),
        description: "offscreen windows",
    },
    OwnerPairPhrase {
        pattern: CriterionPattern::new(Property::IsOnscreen, Literal::Flag(true)),
        description: "onscreen windows",
    },
    OwnerPairPhrase {
        pattern: CriterionPattern::new(Property::X, Literal::Integer(0)),
        description: "windows at the left edge",
    },
    OwnerPairPhrase {
        pattern: CriterionPattern::new(Property::Height, Literal::Integer(0)),
        description: "zero-height windows",
    },
    OwnerPairPhrase {
        pattern: CriterionPattern::new(Property::Width, Literal::Integer(0)),
        description: "zero-width windows",
    },
];

pub const DEFAULT: PhraseBook = PhraseBook {
    owner_names: OWNER_NAMES,
    window_names: WINDOW_NAMES,
    templates: TEMPLATES,
    composites: COMPOSITES,
    owner_pairs: OWNER_PAIRS,
};
