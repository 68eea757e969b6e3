use serde::{Deserialize, Serialize};

/// Declared visibility of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// Modifier filter used when listing the methods of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodFilter {
    pub static_only: bool,
    pub public: bool,
    pub protected: bool,
    pub private: bool,
}

impl MethodFilter {
    /// Hook and service declarations: static, public or protected.
    pub const HOOKS: Self = Self {
        static_only: true,
        public: true,
        protected: true,
        private: false,
    };

    /// Dispatchers on the host class are always static public.
    pub const DISPATCHERS: Self = Self {
        static_only: true,
        public: true,
        protected: false,
        private: false,
    };

    pub const ALL: Self = Self {
        static_only: false,
        public: true,
        protected: true,
        private: true,
    };

    pub fn matches(&self, visibility: Visibility, is_static: bool) -> bool {
        if self.static_only && !is_static {
            return false;
        }
        match visibility {
            Visibility::Public => self.public,
            Visibility::Protected => self.protected,
            Visibility::Private => self.private,
        }
    }
}

/// A method declaration split into signature and inner body.
///
/// `signature` is the declaration text up to (not including) the opening
/// brace, e.g. `public static function Billing_onInvoice($invoice)`.
/// `body` holds the statements only, dedented, without surrounding blank
/// lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub signature: String,
    pub body: String,
}

impl Method {
    /// Full declaration text, body indented by one `indent` unit.
    pub fn declaration(&self, indent: &str) -> String {
        let mut out = String::with_capacity(self.signature.len() + self.body.len() + 16);
        out.push_str(&self.signature);
        out.push_str("\n{\n");
        for line in self.body.lines() {
            if !line.trim().is_empty() {
                out.push_str(indent);
                out.push_str(line);
            }
            out.push('\n');
        }
        out.push('}');
        out
    }
}

/// Remove the common leading indentation and surrounding blank lines.
pub fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let lines = &lines[first..=last];

    let common = lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| if l.is_empty() { "" } else { &l[common..] })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(body: &str) -> Method {
        Method {
            name: "Billing_onInvoice".into(),
            visibility: Visibility::Public,
            is_static: true,
            signature: "public static function Billing_onInvoice()".into(),
            body: body.into(),
        }
    }

    #[test]
    fn filter_respects_static_and_visibility() {
        assert!(MethodFilter::HOOKS.matches(Visibility::Protected, true));
        assert!(!MethodFilter::HOOKS.matches(Visibility::Public, false));
        assert!(!MethodFilter::HOOKS.matches(Visibility::Private, true));
        assert!(!MethodFilter::DISPATCHERS.matches(Visibility::Protected, true));
        assert!(MethodFilter::ALL.matches(Visibility::Private, false));
    }

    #[test]
    fn declaration_indents_body_lines() {
        let m = method("log(\"invoice\");\n\nif ($x) {\n    audit();\n}");
        assert_eq!(
            m.declaration("\t"),
            "public static function Billing_onInvoice()\n{\n\tlog(\"invoice\");\n\n\tif ($x) {\n\t    audit();\n\t}\n}"
        );
    }

    #[test]
    fn declaration_with_empty_body() {
        assert_eq!(
            method("").declaration("    "),
            "public static function Billing_onInvoice()\n{\n}"
        );
    }

    #[test]
    fn dedent_keeps_relative_indentation() {
        let text = "\n        if ($a) {\n            b();\n        }\n\n";
        assert_eq!(dedent(text), "if ($a) {\n    b();\n}");
    }

    #[test]
    fn dedent_of_blank_text_is_empty() {
        assert_eq!(dedent("  \n\t\n"), "");
    }

    #[test]
    fn visibility_keywords_are_case_insensitive() {
        assert_eq!(Visibility::from_keyword("PROTECTED"), Some(Visibility::Protected));
        assert_eq!(Visibility::from_keyword("static"), None);
    }
}
