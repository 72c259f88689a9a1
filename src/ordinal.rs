//! Ordinal words to 1-based row positions.
//!
//! `"first"` → 1, `"twelfth"` → 12, `"twenty-first"` → 21, up to
//! `"ninety-ninth"` → 99. Separators (`-`, `_`, spaces) and case are ignored,
//! so `twenty_first`, `TwentyFirst` and `twenty first` all resolve.

/// Ones words, index + 1 is the magnitude. Second column holds the older
/// spellings that are still accepted.
const ONES: [(&str, Option<&str>); 9] = [
    ("first", None),
    ("second", None),
    ("third", None),
    ("fourth", None),
    ("fifth", None),
    ("sixth", None),
    ("seventh", None),
    ("eighth", Some("eigth")),
    ("ninth", Some("nineth")),
];

/// Tens table entry: either a direct magnitude or a decade with its fragment
#[derive(Clone, Copy)]
enum Tens {
    Direct(usize),
    Decade(usize, &'static [&'static str]),
}

const TENS: [(&str, Tens); 19] = [
    ("tenth", Tens::Direct(10)),
    ("eleventh", Tens::Direct(11)),
    ("twelfth", Tens::Direct(12)),
    ("thirteenth", Tens::Direct(13)),
    ("fourteenth", Tens::Direct(14)),
    ("fifteenth", Tens::Direct(15)),
    ("sixteenth", Tens::Direct(16)),
    ("seventeenth", Tens::Direct(17)),
    ("eighteenth", Tens::Direct(18)),
    ("nineteenth", Tens::Direct(19)),
    ("twentieth", Tens::Decade(20, &["twenty"])),
    ("thirtieth", Tens::Decade(30, &["thirty"])),
    ("fortieth", Tens::Decade(40, &["forty", "fourty"])),
    ("fourtieth", Tens::Decade(40, &["forty", "fourty"])),
    ("fiftieth", Tens::Decade(50, &["fifty"])),
    ("sixtieth", Tens::Decade(60, &["sixty"])),
    ("seventieth", Tens::Decade(70, &["seventy"])),
    ("eightieth", Tens::Decade(80, &["eighty"])),
    ("ninetieth", Tens::Decade(90, &["ninety"])),
];

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn ones(word: &str) -> Option<usize> {
    ONES.iter()
        .position(|(name, old)| *name == word || *old == Some(word))
        .map(|idx| idx + 1)
}

fn tens(word: &str) -> Option<usize> {
    TENS.iter().find(|(name, _)| *name == word).map(|(_, t)| match t {
        Tens::Direct(n) | Tens::Decade(n, _) => *n,
    })
}

/// Resolve an ordinal name to its 1-based position, `None` if it is not one.
pub fn resolve(name: &str) -> Option<usize> {
    let word = normalize(name);
    if word.is_empty() {
        return None;
    }
    if let Some(n) = ones(&word).or_else(|| tens(&word)) {
        return Some(n);
    }

    TENS.iter().find_map(|(_, t)| match t {
        Tens::Decade(value, fragments) => fragments.iter().find_map(|fragment| {
            word.strip_prefix(fragment)
                .and_then(ones)
                .map(|unit| value + unit)
        }),
        Tens::Direct(_) => None,
    })
}
