//! Naming conventions shared by join inference, include resolution and
//! entity table defaults.
//!
//! Only the last `_`-separated segment of a name is inflected, so
//! `blog_posts` singularizes to `blog_post`. Casing is delegated to `heck`.

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

/// Words that read the same in singular and plural
const UNCOUNTABLE: &[&str] = &[
    "aircraft",
    "data",
    "deer",
    "equipment",
    "fish",
    "information",
    "jeans",
    "metadata",
    "money",
    "moose",
    "news",
    "police",
    "rice",
    "series",
    "sheep",
    "software",
    "species",
];

/// (singular, plural) pairs the suffix rules get wrong
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("louse", "lice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("ox", "oxen"),
    ("leaf", "leaves"),
    ("loaf", "loaves"),
    ("thief", "thieves"),
    ("wolf", "wolves"),
    ("half", "halves"),
    ("elf", "elves"),
    ("shelf", "shelves"),
    ("calf", "calves"),
    ("self", "selves"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("life", "lives"),
    ("cactus", "cacti"),
    ("alumnus", "alumni"),
    ("fungus", "fungi"),
    ("nucleus", "nuclei"),
    ("radius", "radii"),
    ("stimulus", "stimuli"),
    ("syllabus", "syllabi"),
    ("medium", "media"),
    ("curriculum", "curricula"),
    ("bacterium", "bacteria"),
    ("memorandum", "memoranda"),
    ("criterion", "criteria"),
    ("phenomenon", "phenomena"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("appendix", "appendices"),
    ("axis", "axes"),
    ("hero", "heroes"),
    ("potato", "potatoes"),
    ("tomato", "tomatoes"),
    ("echo", "echoes"),
    ("veto", "vetoes"),
    ("torpedo", "torpedoes"),
    ("quiz", "quizzes"),
];

/// Singulars ending in `-e` whose plural the `-ches`/`-shes`/`-sses` rule
/// would cut back too far
const KEEPS_E: &[&str] = &[
    "avalanche",
    "cache",
    "cliche",
    "crevasse",
    "creche",
    "headache",
    "impasse",
    "moustache",
    "mustache",
    "niche",
    "psyche",
    "quiche",
];

/// Singulars ending in `-ie`, which the `-ies` → `-y` rule gets wrong
const IE_WORDS: &[&str] = &[
    "auntie", "brownie", "calorie", "cookie", "cutie", "foodie", "freebie", "genie", "goalie",
    "groupie", "hippie", "hoodie", "lie", "movie", "newbie", "pie", "prairie", "rookie", "selfie",
    "smoothie", "sortie", "tie", "veggie", "zombie",
];

/// Singulars ending in a single `s` that pluralize with `-es`
const TAKES_ES: &[&str] = &[
    "alias",
    "apparatus",
    "atlas",
    "bias",
    "bonus",
    "bus",
    "campus",
    "canvas",
    "census",
    "chorus",
    "circus",
    "fetus",
    "gas",
    "iris",
    "lens",
    "minus",
    "octopus",
    "plus",
    "prospectus",
    "sinus",
    "status",
    "surplus",
    "thesaurus",
    "virus",
    "walrus",
];

/// Stems of `-sis` singulars with `-ses` plurals: `oa` for `oasis`/`oases`
const SIS_STEMS: &[&str] = &[
    "analy", "cri", "diagno", "empha", "hypothe", "oa", "parenthe", "progno", "synop", "the",
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Split `blog_posts` into (`blog_`, `posts`)
fn split_last_segment(word: &str) -> (&str, &str) {
    match word.rfind('_') {
        Some(idx) => word.split_at(idx + 1),
        None => ("", word),
    }
}

/// Re-apply the casing of `original` (lowercase or capitalized) to `inflected`
fn match_case(original: &str, inflected: String) -> String {
    if original.chars().all(|c| !c.is_lowercase()) && original.len() > 1 {
        return inflected.to_uppercase();
    }
    match original.chars().next() {
        Some(first) if first.is_uppercase() => {
            let mut chars = inflected.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect(),
                None => inflected,
            }
        }
        _ => inflected,
    }
}

fn inflect(word: &str, rule: fn(&str) -> String) -> String {
    let (prefix, last) = split_last_segment(word);
    if last.is_empty() {
        return word.to_string();
    }
    let inflected = rule(&last.to_lowercase());
    format!("{prefix}{}", match_case(last, inflected))
}

fn singular_of(word: &str) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(s, p)| *p == word || *s == word) {
        return (*singular).to_string();
    }
    if TAKES_ES.contains(&word) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        if KEEPS_E.contains(&stem) || IE_WORDS.contains(&stem) {
            return stem.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        if TAKES_ES.contains(&stem) {
            return stem.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix("ses") {
        if SIS_STEMS.contains(&stem) {
            return format!("{stem}sis");
        }
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().last().is_some_and(|c| !is_vowel(c) && c != 'y') {
            return format!("{stem}y");
        }
    }
    for suffix in ["xes", "ches", "shes", "sses", "zzes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

fn plural_of(word: &str) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(s, p)| *s == word || *p == word) {
        return (*plural).to_string();
    }
    if let Some(stem) = word.strip_suffix("sis") {
        if SIS_STEMS.contains(&stem) {
            return format!("{stem}ses");
        }
    }
    if let Some(stem) = word.strip_suffix('y') {
        if stem.chars().last().is_some_and(|c| !is_vowel(c)) {
            return format!("{stem}ies");
        }
    }
    for suffix in ["s", "x", "z", "ch", "sh"] {
        if word.ends_with(suffix) {
            return format!("{word}es");
        }
    }
    format!("{word}s")
}

/// `comments` → `comment`, `people` → `person`, `blog_posts` → `blog_post`
pub fn singularize(word: &str) -> String {
    inflect(word, singular_of)
}

/// `comment` → `comments`, `person` → `people`
pub fn pluralize(word: &str) -> String {
    inflect(word, plural_of)
}

/// `firstName` → `first_name`
pub fn snake_case(name: &str) -> String {
    name.to_snake_case()
}

/// `user_id` → `userId`
pub fn camel_case(name: &str) -> String {
    name.to_lower_camel_case()
}

/// Table name → type name: `blog_posts` → `BlogPost`
pub fn classify(table: &str) -> String {
    singularize(&snake_case(table)).to_upper_camel_case()
}

/// Type name → table name: `BlogPost` → `blog_posts`, `Person` → `people`
pub fn tableize(type_name: &str) -> String {
    pluralize(&snake_case(type_name))
}

/// Foreign key column that references `table`: `users` → `user_id`
pub fn foreign_key(table: &str) -> String {
    format!("{}_id", singularize(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irregular_singularize() {
        for (singular, plural) in IRREGULAR {
            assert_eq!(singularize(plural), *singular, "singularize({plural})");
        }
    }

    #[test]
    fn test_irregular_pluralize() {
        for (singular, plural) in IRREGULAR {
            assert_eq!(pluralize(singular), *plural, "pluralize({singular})");
        }
    }

    #[test]
    fn test_irregular_is_stable() {
        for (singular, plural) in IRREGULAR {
            assert_eq!(singularize(singular), *singular, "singularize({singular})");
            assert_eq!(pluralize(plural), *plural, "pluralize({plural})");
        }
    }

    #[test]
    fn test_word_tables_round_trip() {
        let singulars = KEEPS_E
            .iter()
            .chain(IE_WORDS)
            .chain(TAKES_ES)
            .map(|w| w.to_string())
            .chain(SIS_STEMS.iter().map(|stem| format!("{stem}sis")));
        for singular in singulars {
            let plural = pluralize(&singular);
            assert_eq!(singularize(&plural), singular, "singularize({plural})");
            assert_eq!(singularize(&singular), singular, "singularize({singular})");
        }
    }

    #[test]
    fn test_uncountable() {
        for word in UNCOUNTABLE {
            assert_eq!(singularize(word), *word);
            assert_eq!(pluralize(word), *word);
        }
    }

    #[test]
    fn test_regular_singularize() {
        let cases = [
            ("users", "user"),
            ("posts", "post"),
            ("comments", "comment"),
            ("moderators", "moderator"),
            ("categories", "category"),
            ("queries", "query"),
            ("days", "day"),
            ("keys", "key"),
            ("boxes", "box"),
            ("matches", "match"),
            ("wishes", "wish"),
            ("addresses", "address"),
            ("classes", "class"),
            ("buzzes", "buzz"),
            ("videos", "video"),
            ("shoes", "shoe"),
            ("houses", "house"),
            ("drives", "drive"),
            ("caches", "cache"),
            ("niches", "niche"),
            ("headaches", "headache"),
            ("coaches", "coach"),
            ("sandwiches", "sandwich"),
            ("lies", "lie"),
            ("movies", "movie"),
            ("canvases", "canvas"),
            ("statuses", "status"),
            ("buses", "bus"),
            ("oases", "oasis"),
            ("analyses", "analysis"),
            ("cases", "case"),
            ("databases", "database"),
            ("bases", "base"),
            ("causes", "cause"),
        ];
        for (plural, singular) in cases {
            assert_eq!(singularize(plural), singular, "singularize({plural})");
        }
    }

    #[test]
    fn test_regular_pluralize() {
        let cases = [
            ("user", "users"),
            ("comment", "comments"),
            ("category", "categories"),
            ("day", "days"),
            ("box", "boxes"),
            ("match", "matches"),
            ("wish", "wishes"),
            ("address", "addresses"),
            ("buzz", "buzzes"),
            ("video", "videos"),
            ("cache", "caches"),
            ("lie", "lies"),
            ("canvas", "canvases"),
            ("status", "statuses"),
            ("oasis", "oases"),
            ("crisis", "crises"),
        ];
        for (singular, plural) in cases {
            assert_eq!(pluralize(singular), plural, "pluralize({singular})");
        }
    }

    #[test]
    fn test_singular_input_is_unchanged() {
        for word in ["user", "post", "address", "class", "category", "box", "analysis"] {
            assert_eq!(singularize(word), word);
        }
    }

    #[test]
    fn test_compound_names_inflect_last_segment() {
        assert_eq!(singularize("blog_posts"), "blog_post");
        assert_eq!(singularize("admin_people"), "admin_person");
        assert_eq!(pluralize("line_item"), "line_items");
        assert_eq!(pluralize("sales_person"), "sales_people");
    }

    #[test]
    fn test_case_is_preserved() {
        assert_eq!(singularize("People"), "Person");
        assert_eq!(pluralize("Child"), "Children");
        assert_eq!(singularize("USERS"), "USER");
    }

    #[test]
    fn test_casing_helpers() {
        assert_eq!(snake_case("firstName"), "first_name");
        assert_eq!(snake_case("first_name"), "first_name");
        assert_eq!(camel_case("user_id"), "userId");
    }

    #[test]
    fn test_classify_and_tableize() {
        assert_eq!(classify("comments"), "Comment");
        assert_eq!(classify("blog_posts"), "BlogPost");
        assert_eq!(classify("people"), "Person");
        assert_eq!(tableize("BlogPost"), "blog_posts");
        assert_eq!(tableize("Person"), "people");
        assert_eq!(tableize("Category"), "categories");
    }

    #[test]
    fn test_foreign_key() {
        assert_eq!(foreign_key("users"), "user_id");
        assert_eq!(foreign_key("people"), "person_id");
        assert_eq!(foreign_key("categories"), "category_id");
        assert_eq!(foreign_key("posts"), "post_id");
        assert_eq!(foreign_key("caches"), "cache_id");
        assert_eq!(foreign_key("niches"), "niche_id");
        assert_eq!(foreign_key("canvases"), "canvas_id");
        assert_eq!(foreign_key("oases"), "oasis_id");
        assert_eq!(foreign_key("lies"), "lie_id");
    }
}
