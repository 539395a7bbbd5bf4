/// Convenience macro for creating a [`Document`](crate::Document) literal.
///
/// Values are anything convertible [`Into`] a [`Value`](crate::Value),
/// including nested `document!` and `array!` literals.
///
/// ```rust
/// # use deltadoc::{document, array};
/// let doc = document! {
///     "name" => "John Doe",
///     "age" => 43,
///     "phones" => array!["+44 1234567", "+44 2345678"],
///     "address" => document! {
///         "city" => "London"
///     },
/// };
/// assert_eq!(doc.len(), 4);
/// ```
#[macro_export]
macro_rules! document {
    () => {
        $crate::Document::new()
    };
    ( $($field:expr => $value:expr),* $(,)? ) => {
        {
            let mut doc = $crate::Document::new();
            $( doc.put($field, $value); )*
            doc
        }
    };
}

/// Convenience macro for creating an [`Array`](crate::Array) literal.
///
/// ```rust
/// # use deltadoc::{array, Value};
/// let arr = array![1, "two", 3.0];
/// assert_eq!(arr.get(1), Some(&Value::String("two".into())));
/// ```
#[macro_export]
macro_rules! array {
    () => {
        $crate::Array::new()
    };
    ( $($value:expr),+ $(,)? ) => {
        {
            let mut arr = $crate::Array::new();
            $( arr.push($value); )+
            arr
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Document, Value};

    #[test]
    fn document_literal() {
        let doc = document! {
            "field_x" => "Hello",
            "field_y" => "World",
            "field_z" => document! {
                "nested" => true
            },
        };
        assert_eq!(doc.get("field_x"), Some(&Value::String("Hello".into())));
        assert_eq!(
            doc.get("field_z")
                .and_then(Value::as_document)
                .and_then(|z| z.get("nested")),
            Some(&Value::Boolean(true))
        );
    }

    #[test]
    fn empty_literals() {
        assert_eq!(document! {}, Document::new());
        assert!(array![].is_empty());
    }

    #[test]
    fn array_literal_converts_each_element() {
        let arr = array![1, 2i64, "x", false];
        assert_eq!(arr.len(), 4);
        assert_eq!(arr.get(0), Some(&Value::Int32(1)));
        assert_eq!(arr.get(1), Some(&Value::Int64(2)));
        assert_eq!(arr.get(3), Some(&Value::Boolean(false)));
    }
}
