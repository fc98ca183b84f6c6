//! URL slug generation.
//!
//! Category and product slugs are derived from their names when staff leave
//! the slug field empty, and by the seeding commands. Cyrillic letters are
//! transliterated so Russian names produce readable ASCII slugs.

/// Convert text into a URL slug.
///
/// Lowercases, transliterates Cyrillic, keeps ASCII letters and digits, turns
/// runs of whitespace, hyphens and underscores into a single `-`, drops all
/// other characters and trims leading/trailing hyphens.
///
/// ```
/// use greenshop_core::slugify;
///
/// assert_eq!(slugify("Eco Kitchen Set!"), "eco-kitchen-set");
/// assert_eq!(slugify("Косметика"), "kosmetika");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            push_word(&mut slug, &mut pending_separator, ch.encode_utf8(&mut [0; 4]));
        } else if let Some(latin) = transliterate(ch) {
            if !latin.is_empty() {
                push_word(&mut slug, &mut pending_separator, latin);
            }
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        }
    }

    slug
}

fn push_word(slug: &mut String, pending_separator: &mut bool, part: &str) {
    if *pending_separator && !slug.is_empty() {
        slug.push('-');
    }
    *pending_separator = false;
    slug.push_str(part);
}

/// Latin spelling of a lowercase Cyrillic letter.
///
/// Hard and soft signs map to the empty string.
const fn transliterate(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'э' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}
