//! Member and type modifiers.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Java modifiers on a type, field, or method.
    ///
    /// Serialized in declaration files as `"PUBLIC | STATIC"`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u16 {
        /// `public`
        const PUBLIC = 1 << 0;
        /// `protected`
        const PROTECTED = 1 << 1;
        /// `private`
        const PRIVATE = 1 << 2;
        /// `abstract`
        const ABSTRACT = 1 << 3;
        /// `static`
        const STATIC = 1 << 4;
        /// `final`
        const FINAL = 1 << 5;
        /// `transient`
        const TRANSIENT = 1 << 6;
        /// `synchronized`
        const SYNCHRONIZED = 1 << 7;
    }
}

impl Modifiers {
    /// Renders the modifiers in canonical Java order, each followed by a space.
    pub fn to_source(self) -> String {
        const ORDER: [(Modifiers, &str); 8] = [
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::STATIC, "static"),
            (Modifiers::FINAL, "final"),
            (Modifiers::TRANSIENT, "transient"),
            (Modifiers::SYNCHRONIZED, "synchronized"),
        ];
        ORDER
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, word)| format!("{word} "))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_order() {
        let m = Modifiers::FINAL | Modifiers::STATIC | Modifiers::PUBLIC;
        assert_eq!(m.to_source(), "public static final ");
        assert_eq!(Modifiers::empty().to_source(), "");
    }

    #[test]
    fn json_form() {
        let m = Modifiers::PUBLIC | Modifiers::ABSTRACT;
        let json = serde_json::to_string(&m).unwrap();
        let back: Modifiers = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        let parsed: Modifiers = serde_json::from_str("\"PRIVATE | TRANSIENT\"").unwrap();
        assert_eq!(parsed, Modifiers::PRIVATE | Modifiers::TRANSIENT);
    }
}
