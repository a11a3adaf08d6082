//! Defines helper macros for generating domain port error enums.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    define_port_error! {
        pub enum SampleStoreError {
            Offline => "store offline",
            Timeout { message: String } => "timed out: {message}",
            Stale { record: String, revision: u64 } => "{record} is stale at revision {revision}",
        }
    }

    #[rstest]
    fn unit_variants_get_snake_case_constructors() {
        assert_eq!(SampleStoreError::offline(), SampleStoreError::Offline);
        assert_eq!(SampleStoreError::offline().to_string(), "store offline");
    }

    #[rstest]
    fn string_fields_accept_str_and_string() {
        assert_eq!(SampleStoreError::timeout("read").to_string(), "timed out: read");
        assert_eq!(
            SampleStoreError::timeout(String::from("commit")).to_string(),
            "timed out: commit"
        );
    }

    #[rstest]
    fn mixed_fields_keep_their_types() {
        let error = SampleStoreError::stale("problems/two-sum", 4_u64);
        assert_eq!(error.to_string(), "problems/two-sum is stale at revision 4");
    }
}
