//! Round-trip helper for object-file fixtures.

/// Assert that writing a value and reading it back reproduces it exactly.
macro_rules! assert_read_write {
    ($object:expr) => {{
        let object = $object;
        let rendered = crate::write::write_object(&object);
        let parsed = crate::read::read(&rendered).unwrap();

        assert_eq!(parsed, object, "read(write_object(value)) should round-trip");
    }};
}
