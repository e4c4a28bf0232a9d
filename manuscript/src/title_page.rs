use crate::compile::ChapterBreak;
use crate::front_matter::FrontMatter;

/// Title page content read from `header_material.md` front matter.
///
/// Recognized keys (all optional): `title`, `subtitle`, `author`, `email`,
/// `phone`, `address` (string or list), `street`, `city`, `state`,
/// `postal_code` (or `zip`), `country`, and `word_count` (or
/// `approx_word_count`) to override the computed count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitlePage {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Vec<String>,
    pub word_count: Option<String>,
}

impl TitlePage {
    pub fn from_front_matter(meta: &FrontMatter) -> Self {
        let mut address = meta.get_lines("address");
        if let Some(street) = meta.get_str("street") {
            address.push(street);
        }
        if let Some(city) = meta.get_str("city") {
            let mut locality = city;
            if let Some(state) = meta.get_str("state") {
                locality.push_str(", ");
                locality.push_str(&state);
            }
            if let Some(postal) = meta.get_str("postal_code").or_else(|| meta.get_str("zip")) {
                locality.push(' ');
                locality.push_str(&postal);
            }
            address.push(locality);
        }
        if let Some(country) = meta.get_str("country") {
            address.push(country);
        }

        TitlePage {
            title: meta.get_str("title"),
            subtitle: meta.get_str("subtitle"),
            author: meta.get_str("author"),
            email: meta.get_str("email"),
            phone: meta.get_str("phone"),
            address,
            word_count: meta
                .get_str("word_count")
                .or_else(|| meta.get_str("approx_word_count")),
        }
    }

    /// Render the page: contact block, centered title block, then a break.
    pub fn render(&self, manuscript_words: usize) -> String {
        let word_count = self
            .word_count
            .clone()
            .unwrap_or_else(|| approximate_word_count(manuscript_words));

        let mut contact: Vec<&str> = Vec::new();
        contact.extend(self.author.as_deref());
        contact.extend(self.address.iter().map(String::as_str));
        contact.extend(self.phone.as_deref());
        contact.extend(self.email.as_deref());
        let word_line = format!("Word Count: {}", word_count);
        contact.push(&word_line);

        let mut heading: Vec<String> = Vec::new();
        if let Some(title) = &self.title {
            heading.push(format!("# {}", title));
        }
        if let Some(subtitle) = &self.subtitle {
            heading.push(format!("## {}", subtitle));
        }
        if let Some(author) = &self.author {
            heading.push(format!("by {}", author));
        }

        let mut page = String::new();
        page.push_str(contact.join("\n").trim());
        page.push_str("\n\n");
        if !heading.is_empty() {
            page.push_str(heading.join("\n").trim());
            page.push_str("\n\n");
        }
        page.push_str(ChapterBreak::Rule.render());
        page
    }
}

/// Round to the nearest thousand (ties to even) and group digits with commas.
pub fn approximate_word_count(words: usize) -> String {
    let thousands = (words as f64 / 1000.0).round_ties_even() as u64;
    group_thousands(thousands * 1000)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
