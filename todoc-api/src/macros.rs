/// Builder-style setters for request payloads.
///
/// `opt` wraps the value in `Some`; `a.b` targets a field of a nested struct.
macro_rules! setters {
    () => {};

    (opt $field:ident . $subfield:ident : $ty:ty $(, $($rest:tt)*)?) => {
        pub fn $subfield<T>(mut self, $subfield: T) -> Self
        where
            T: Into<$ty>,
        {
            self.$field.$subfield = Some($subfield.into());
            self
        }

        $(setters!($($rest)*);)?
    };

    (opt $field:ident : $ty:ty $(, $($rest:tt)*)?) => {
        pub fn $field<T>(mut self, $field: T) -> Self
        where
            T: Into<$ty>,
        {
            self.$field = Some($field.into());
            self
        }

        $(setters!($($rest)*);)?
    };

    ($field:ident : $ty:ty $(, $($rest:tt)*)?) => {
        pub fn $field<T>(mut self, $field: T) -> Self
        where
            T: Into<$ty>,
        {
            self.$field = $field.into();
            self
        }

        $(setters!($($rest)*);)?
    };
}

pub(crate) use setters;
