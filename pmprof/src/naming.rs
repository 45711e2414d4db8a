//! Profile name resolution.
//!
//! Every public operation identifies its profile in one of three ways:
//!
//! - an explicit name (`"orders"`)
//! - a sample object whose type exposes a category name
//!   ([`ProfileRef::of`])
//! - nothing at all, which selects the configurable default profile
//!
//! [`ProfileRef`] captures that choice; [`resolve`] turns it into the concrete
//! registry key.

use std::borrow::Cow;

/// Initial value of the default profile name.
pub const DEFAULT_PROFILE_NAME: &str = "Profile1";

/// Types that can name a profile by example.
///
/// The default category name is the short type name (`OrderService` for
/// `my_app::service::OrderService<Db>`). Implement `category_name` to group
/// several types under one profile.
///
/// ```
/// use pmprof::{ProfileCategory, ProfileRef};
///
/// struct OrderService;
/// impl ProfileCategory for OrderService {}
///
/// let service = OrderService;
/// assert_eq!(ProfileRef::of(&service), ProfileRef::named("OrderService"));
/// ```
pub trait ProfileCategory {
    /// Name of the profile this value reports under.
    fn category_name(&self) -> Cow<'static, str> {
        Cow::Owned(short_type_name(std::any::type_name::<Self>()).to_string())
    }
}

/// How a call identifies its profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProfileRef<'a> {
    /// Use the profiler's current default profile name.
    #[default]
    Default,
    /// Use this name.
    Named(Cow<'a, str>),
}

impl<'a> ProfileRef<'a> {
    /// Reference a profile by name.
    pub fn named(name: impl Into<Cow<'a, str>>) -> Self {
        ProfileRef::Named(name.into())
    }

    /// Reference the profile named by a sample object's category.
    pub fn of<T: ProfileCategory + ?Sized>(sample: &T) -> Self {
        ProfileRef::Named(sample.category_name())
    }

    /// The concrete profile name, falling back to `default`.
    ///
    /// An empty explicit name also selects the default so that a resolved
    /// name is never empty.
    pub fn resolve<'s>(&'s self, default: &'s str) -> Cow<'s, str> {
        let explicit = match self {
            ProfileRef::Named(name) => Some(name.as_ref()),
            ProfileRef::Default => None,
        };
        resolve(explicit, None, default)
    }
}

impl<'a> From<&'a str> for ProfileRef<'a> {
    fn from(name: &'a str) -> Self {
        ProfileRef::Named(Cow::Borrowed(name))
    }
}

impl<'a> From<&'a String> for ProfileRef<'a> {
    fn from(name: &'a String) -> Self {
        ProfileRef::Named(Cow::Borrowed(name.as_str()))
    }
}

impl From<String> for ProfileRef<'static> {
    fn from(name: String) -> Self {
        ProfileRef::Named(Cow::Owned(name))
    }
}

impl<'a> From<Option<&'a str>> for ProfileRef<'a> {
    fn from(name: Option<&'a str>) -> Self {
        match name {
            Some(name) => ProfileRef::from(name),
            None => ProfileRef::Default,
        }
    }
}

/// Resolve a profile name from an explicit name, a sample, or the default.
///
/// The explicit name wins when present and non-empty; otherwise the sample's
/// category name is used; otherwise `default`.
pub fn resolve<'a>(
    explicit: Option<&'a str>,
    sample: Option<&dyn ProfileCategory>,
    default: &'a str,
) -> Cow<'a, str> {
    match (explicit, sample) {
        (Some(name), _) if !name.is_empty() => Cow::Borrowed(name),
        (_, Some(sample)) => {
            let name = sample.category_name();
            if name.is_empty() {
                Cow::Borrowed(default)
            } else {
                Cow::Owned(name.into_owned())
            }
        }
        _ => Cow::Borrowed(default),
    }
}

/// Strip the module path and generic arguments from a type name.
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;
    impl ProfileCategory for Widget {}

    struct Renamed;
    impl ProfileCategory for Renamed {
        fn category_name(&self) -> Cow<'static, str> {
            Cow::Borrowed("Billing")
        }
    }

    #[allow(dead_code)]
    struct Generic<T>(T);
    impl<T> ProfileCategory for Generic<T> {}

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Widget"), "Widget");
        assert_eq!(short_type_name("Widget"), "Widget");
        assert_eq!(short_type_name("alloc::vec::Vec<core::u8>"), "Vec");
    }

    #[test]
    fn test_default_category_is_short_type_name() {
        assert_eq!(Widget.category_name(), "Widget");
        assert_eq!(Generic(5u8).category_name(), "Generic");
    }

    #[test]
    fn test_custom_category_name() {
        assert_eq!(ProfileRef::of(&Renamed), ProfileRef::named("Billing"));
    }

    #[test]
    fn test_category_through_trait_object() {
        let sample: &dyn ProfileCategory = &Widget;
        assert_eq!(sample.category_name(), "Widget");
    }

    #[test]
    fn test_profile_ref_resolution() {
        assert_eq!(ProfileRef::Default.resolve("Profile1"), "Profile1");
        assert_eq!(ProfileRef::from("P").resolve("Profile1"), "P");
        assert_eq!(ProfileRef::from("").resolve("Profile1"), "Profile1");
        assert_eq!(ProfileRef::from(None::<&str>).resolve("Profile1"), "Profile1");
        assert_eq!(ProfileRef::from(Some("Q")).resolve("Profile1"), "Q");
        assert_eq!(ProfileRef::from("R".to_string()).resolve("Profile1"), "R");
    }

    #[test]
    fn test_resolve_precedence() {
        let widget: &dyn ProfileCategory = &Widget;
        assert_eq!(resolve(Some("explicit"), Some(widget), "dflt"), "explicit");
        assert_eq!(resolve(None, Some(widget), "dflt"), "Widget");
        assert_eq!(resolve(Some(""), Some(widget), "dflt"), "Widget");
        assert_eq!(resolve(None, None, "dflt"), "dflt");
    }
}
