//! A gate that lets its credential escape. Every item below must be flagged.

pub struct Secret<T>(T);

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose_secret(&self) -> &T {
        &self.0
    }
}

pub fn deny_reason(user: &str, token: &Secret<String>) -> String {
    format!("{user} is not a member (token {})", token.expose_secret())
}

pub fn header_value(token: &Secret<String>) -> String {
    format!("Bearer {}", Secret::expose_secret(token))
}

pub fn trace_context(raw_context: &str) {
    println!("context: {raw_context}");
}
