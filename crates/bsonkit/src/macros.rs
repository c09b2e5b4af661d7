//! Construction macros for documents and arrays.

/// Builds a [`Document`](crate::Document) from `name => value` pairs.
///
/// Names convert through `Into<String>` and values through
/// [`Value::from`](crate::Value), so literals, arrays and nested `doc!`
/// calls all work:
///
/// ```
/// use bsonkit::doc;
///
/// let d = doc! {
///     "name" => "widget",
///     "count" => 3,
///     "tags" => ["a", "b"],
///     "dims" => doc! { "w" => 10, "h" => 20 },
/// };
/// assert_eq!(d.get_i32("count"), Ok(3));
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::Document::new()
    };
    ( $($key:expr => $value:expr),+ $(,)? ) => {{
        let mut doc = $crate::Document::new();
        $( doc.insert($key, $value); )+
        doc
    }};
}

/// Builds an [`Array`](crate::Array), converting each element through
/// [`Value::from`](crate::Value). Unlike a plain array literal, elements
/// may have mixed types.
///
/// ```
/// use bsonkit::{array, doc};
///
/// let d = doc! { "mixed" => array![1, "two", 3.0] };
/// assert_eq!(d.get_array("mixed").unwrap().len(), 3);
/// ```
#[macro_export]
macro_rules! array {
    () => {
        $crate::Array::new()
    };
    ( $($value:expr),+ $(,)? ) => {
        vec![ $($crate::Value::from($value)),+ ]
    };
}
