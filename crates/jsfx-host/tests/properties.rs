//! Property-based tests for jsfx-host.
//!
//! Covers enumeration normalization, the import depth limit and sample
//! processing using proptest for randomized inputs.

mod common;

use std::sync::Arc;

use common::{compiled_in, config, load_in, write_file};
use jsfx_host::{Effect, LoadError, LoadOptions};
use proptest::prelude::*;
use tempfile::TempDir;

fn enum_name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever range an enumeration declares, it loads as `0..count`
    /// step 1 with at least one entry.
    #[test]
    fn enumerations_are_normalized(
        names in prop::collection::vec(enum_name(), 0..6),
        min in -5i32..5,
        max in -5i32..20,
        inc in 0i32..4,
    ) {
        let dir = TempDir::new().unwrap();
        let text = format!("desc:x\nslider1:0<{min},{max},{inc}{{{}}}>Choice\n", names.join(","));
        let fx = load_in(dir.path(), config(), &text);

        let count = names.len().max(1);
        let range = fx.slider_range(0).unwrap();
        prop_assert!(fx.slider_is_enum(0));
        prop_assert_eq!(fx.slider_enum_names(0).len(), count);
        prop_assert_eq!(range.min, 0.0);
        prop_assert_eq!(range.max, (count - 1) as f64);
        prop_assert_eq!(range.inc, 1.0);
    }

    /// Slider values reach `@sample` through the alias.
    #[test]
    fn gain_scales_input(
        gain in 0.0f64..=1.0,
        input in prop::collection::vec(-1.0f64..=1.0, 1..64),
    ) {
        let dir = TempDir::new().unwrap();
        let mut fx = compiled_in(
            dir.path(),
            config(),
            "desc:x\nin_pin:in\nout_pin:out\nslider1:amount=1<0,1>Amount\n@sample\nspl0 = spl0 * amount;\n",
        );
        fx.set_slider_value(0, gain);

        let mut out = vec![0.0; input.len()];
        fx.process_f64(&[input.as_slice()], &mut [out.as_mut_slice()], input.len());
        for (x, y) in input.iter().zip(&out) {
            prop_assert!((x * gain - y).abs() < 1e-12);
        }
    }

    /// Triggers outside `0..10` are rejected.
    #[test]
    fn trigger_range(index in 0u32..64) {
        let mut fx = Effect::new(Arc::new(config()));
        prop_assert_eq!(fx.send_trigger(index), index < 10);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// A chain of nested imports loads exactly when it fits the depth limit.
    #[test]
    fn import_depth_limit(depth in 0usize..40) {
        let dir = TempDir::new().unwrap();
        for i in 0..depth {
            let text = if i + 1 < depth { format!("import f{}.jsfx-inc\n", i + 1) } else { String::new() };
            write_file(dir.path(), &format!("f{i}.jsfx-inc"), &text);
        }
        let main = if depth > 0 { "desc:x\nimport f0.jsfx-inc\n" } else { "desc:x\n" };
        let path = write_file(dir.path(), "main.jsfx", main);

        let mut fx = Effect::new(Arc::new(config()));
        match fx.load(&path, LoadOptions::default()) {
            Ok(()) => {
                prop_assert!(depth <= 32);
                prop_assert_eq!(fx.source().unwrap().imports.len(), depth);
            }
            Err(err) => {
                prop_assert!(depth > 32);
                let too_deep = matches!(err, LoadError::TooManyImportLevels { .. });
                prop_assert!(too_deep);
            }
        }
    }
}
