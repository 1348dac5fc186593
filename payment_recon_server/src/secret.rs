use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A wrapper around sensitive configuration values, such as the webhook signing secret.
///
/// The inner value never appears in `Debug` or `Display` output, so secrets can't leak into logs by accident.
/// Call [`Secret::reveal`] at the point where the raw value is actually needed.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::Secret;

    #[test]
    fn secrets_do_not_leak_in_logs() {
        let secret = Secret::new("super-secret-hmac-key".to_string());
        assert_eq!(format!("{secret}"), "****");
        assert_eq!(format!("{secret:?}"), "****");
        assert_eq!(secret.reveal(), "super-secret-hmac-key");
    }
}
