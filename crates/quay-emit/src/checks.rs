//! Platform-check aggregation and name conversion.
//!
//! Every package's declared checks fold into a single workspace-wide
//! helper descriptor so each probe runs once no matter how many packages
//! ask for it. Probe result variables follow the `HAVE_`-style naming
//! conventions; inputs that are not valid identifiers (headers with
//! slashes, pointer types) are mangled the standard way.

use quay_model::Config;
use quay_model::MANIFEST_FILENAME;

use crate::descriptor::{CheckDirective, ChecksDescriptor, SizeBinding, HELPER_TARGET};

/// `HAVE_`-variable for a function or symbol check.
pub fn convert_function(name: &str) -> String {
    format!("HAVE_{}", name.to_uppercase())
}

/// `HAVE_`-variable for an include check. Slashes and dots mangle to
/// underscores.
pub fn convert_include(header: &str) -> String {
    let mangled: String = header
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("HAVE_{mangled}")
}

/// Prefixed variable for a type check. `*` mangles to `P` so pointer
/// types stay distinguishable from their pointees.
pub fn convert_type(typ: &str, prefix: &str) -> String {
    let mangled: String = typ
        .to_uppercase()
        .chars()
        .map(|c| {
            if c == '*' {
                'P'
            } else if c.is_ascii_alphanumeric() {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{prefix}{mangled}")
}

/// Result variable of the endianness probe.
const ENDIANNESS_VARIABLE: &str = "WORDS_BIGENDIAN";

/// Aliases bound to the endianness result for consumers that test a
/// different spelling.
const ENDIANNESS_ALIASES: [&str; 3] = ["BIG_ENDIAN", "BIGENDIAN", "HOST_BIG_ENDIAN"];

/// Aggregate all check registries into the helper descriptor.
pub fn generate_checks(cfg: &Config) -> ChecksDescriptor {
    let mut checks = Vec::new();
    let mut conditional_definitions = Vec::new();
    let mut push = |probe: &'static str, input: &str, headers: Vec<String>, variable: String| {
        conditional_definitions.push((variable.clone(), vec![variable.clone()]));
        checks.push(CheckDirective {
            probe,
            input: input.to_string(),
            headers,
            variable,
        });
    };

    for f in &cfg.check_functions {
        push("check_function_exists", f, Vec::new(), convert_function(f));
    }
    for (symbol, headers) in &cfg.check_symbols {
        push(
            "check_symbol_exists",
            symbol,
            headers.iter().cloned().collect(),
            convert_function(symbol),
        );
    }
    for header in &cfg.check_includes {
        push(
            "check_include_files",
            header,
            Vec::new(),
            convert_include(header),
        );
    }
    for typ in &cfg.check_types {
        push("check_type_size", typ, Vec::new(), convert_type(typ, "HAVE_"));
    }
    for lib in &cfg.check_libraries {
        push(
            "check_library_exists",
            lib,
            Vec::new(),
            convert_function(lib),
        );
    }

    // Type probes also record the measured size under both historical
    // spellings.
    let size_bindings = cfg
        .check_types
        .iter()
        .map(|typ| SizeBinding {
            source: convert_type(typ, "HAVE_"),
            size_of: convert_type(typ, "SIZE_OF_"),
            sizeof: convert_type(typ, "SIZEOF_"),
        })
        .collect();

    conditional_definitions.insert(
        0,
        (
            ENDIANNESS_VARIABLE.to_string(),
            ENDIANNESS_ALIASES.iter().map(|s| s.to_string()).collect(),
        ),
    );

    let global_definitions = cfg
        .global_options
        .values()
        .flat_map(|block| block.global_definitions.iter().cloned())
        .collect();

    ChecksDescriptor {
        checks,
        size_bindings,
        endianness_variable: ENDIANNESS_VARIABLE.to_string(),
        endianness_aliases: ENDIANNESS_ALIASES.iter().map(|s| s.to_string()).collect(),
        conditional_definitions,
        helper_target: HELPER_TARGET.to_string(),
        global_definitions,
        rerun_on: MANIFEST_FILENAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quay_model::OptionLevel;

    #[test]
    fn function_conversion() {
        assert_eq!(convert_function("memmem"), "HAVE_MEMMEM");
    }

    #[test]
    fn include_conversion_mangles_separators() {
        assert_eq!(convert_include("sys/types.h"), "HAVE_SYS_TYPES_H");
        assert_eq!(convert_include("stdint.h"), "HAVE_STDINT_H");
    }

    #[test]
    fn type_conversion_mangles_pointers() {
        assert_eq!(convert_type("void *", "HAVE_"), "HAVE_VOID_P");
        assert_eq!(convert_type("void *", "SIZE_OF_"), "SIZE_OF_VOID_P");
        assert_eq!(convert_type("size_t", "SIZEOF_"), "SIZEOF_SIZE_T");
        assert_eq!(convert_type("long long", "HAVE_"), "HAVE_LONG_LONG");
    }

    #[test]
    fn builtin_type_checks_always_present() {
        let desc = generate_checks(&Config::default());
        let type_checks: Vec<_> = desc
            .checks
            .iter()
            .filter(|c| c.probe == "check_type_size")
            .map(|c| c.input.as_str())
            .collect();
        assert!(type_checks.contains(&"size_t"));
        assert!(type_checks.contains(&"void *"));
        assert_eq!(desc.size_bindings.len(), 2);
        assert_eq!(desc.rerun_on, "quay.toml");
    }

    #[test]
    fn symbol_checks_carry_headers() {
        let mut cfg = Config::default();
        cfg.check_symbols
            .entry("snprintf".to_string())
            .or_default()
            .insert("stdio.h".to_string());

        let desc = generate_checks(&cfg);
        let check = desc
            .checks
            .iter()
            .find(|c| c.probe == "check_symbol_exists")
            .unwrap();
        assert_eq!(check.input, "snprintf");
        assert_eq!(check.headers, vec!["stdio.h"]);
        assert_eq!(check.variable, "HAVE_SNPRINTF");
    }

    #[test]
    fn endianness_binding_comes_first() {
        let desc = generate_checks(&Config::default());
        assert_eq!(desc.endianness_variable, "WORDS_BIGENDIAN");
        let (variable, aliases) = &desc.conditional_definitions[0];
        assert_eq!(variable, "WORDS_BIGENDIAN");
        assert_eq!(aliases, &["BIG_ENDIAN", "BIGENDIAN", "HOST_BIG_ENDIAN"]);
    }

    #[test]
    fn every_check_variable_gets_a_conditional_definition() {
        let mut cfg = Config::default();
        cfg.check_functions.insert("memmem".to_string());
        let desc = generate_checks(&cfg);
        assert!(desc
            .conditional_definitions
            .iter()
            .any(|(v, defs)| v == "HAVE_MEMMEM" && defs == &["HAVE_MEMMEM".to_string()]));
    }

    #[test]
    fn global_definitions_flatten_all_levels() {
        let mut cfg = Config::default();
        cfg.global_options
            .entry(OptionLevel::Any)
            .or_default()
            .global_definitions
            .insert("A=1".to_string());
        cfg.global_options
            .entry(OptionLevel::Shared)
            .or_default()
            .global_definitions
            .insert("B=2".to_string());

        let desc = generate_checks(&cfg);
        assert_eq!(desc.global_definitions, vec!["A=1", "B=2"]);
    }
}
