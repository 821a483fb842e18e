use anyhow::{anyhow, Result};

use crate::shadow::{self, ShadowKind, ShadowTarget};

use super::PatchContext;

/// Landmark directory carrying the WASI compatibility headers; required
/// whenever a shadow compile actually happens.
const INCLUDE_LANDMARK: &str = "wasi";

/// Optional preconfigured include directory.
const PRECONF_LANDMARK: &str = "wasi-preconf";

/// Sink for discarded cross-compiler output when `-o` names a file with no
/// shadow counterpart.
const NULL_DEVICE: &str = "/dev/null";

/// Source suffixes participating in the compiler's default `-c` output
/// convention (`foo.c` -> `foo.o`).
const SOURCE_SUFFIXES: &[&str] = &[".c", ".cc", ".cpp", ".cxx"];

/// Single pass over a compiler invocation: substitute shadow inputs,
/// rewrite the output, and decide whether a cross invocation happens.
pub(super) fn patch_args(args: &[String], ctx: &PatchContext) -> Result<Option<Vec<String>>> {
    let mut patched = Vec::with_capacity(args.len() + 4);
    let mut consumed = Vec::new();
    let mut output: Option<ShadowTarget> = None;
    let mut compile_only = false;
    let mut explicit_output = false;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        patched.push(shadow::patch_argument(
            arg,
            ctx.config,
            ctx.store,
            Some(&mut consumed),
        ));
        if arg == "-c" {
            compile_only = true;
        } else if arg == "-o" {
            if let Some(value) = args.get(i + 1) {
                i += 1;
                explicit_output = true;
                output = shadow::map_output(value, ctx.config);
                patched.push(match &output {
                    Some(target) => target.path.clone(),
                    // Discarded cross output must never land on a real file.
                    None => NULL_DEVICE.to_string(),
                });
            }
        }
        i += 1;
    }

    // The compiler's default single-source output (`a.c` -> `a.o`) has no
    // `-o` to rewrite; append an explicit one for the cross invocation.
    if compile_only && !explicit_output {
        if let Some(target) = default_output(args) {
            patched.push("-o".to_string());
            patched.push(target.path.clone());
            output = Some(target);
        }
    }

    if output.as_ref().is_some_and(|target| ctx.config.skips(&target.path)) {
        output = None;
    }

    report(output.as_ref(), &consumed, compile_only);

    match output {
        Some(target) => Ok(Some(post_process(&target, patched, ctx)?)),
        None => Ok(None),
    }
}

/// Shadow counterpart of the compiler's default output for a compile-only
/// invocation without `-o`.
fn default_output(args: &[String]) -> Option<ShadowTarget> {
    args.iter()
        .filter(|arg| !arg.starts_with('-'))
        .find_map(|arg| {
            SOURCE_SUFFIXES.iter().find_map(|suffix| {
                arg.strip_suffix(suffix).map(|stem| ShadowTarget {
                    kind: ShadowKind::Object,
                    path: format!("{stem}.wo"),
                    rules: None,
                })
            })
        })
}

/// Inject the WASI include tree and apply per-path configuration rules.
fn post_process(
    target: &ShadowTarget,
    patched: Vec<String>,
    ctx: &PatchContext,
) -> Result<Vec<String>> {
    let include_dir = ctx
        .locator
        .closest(INCLUDE_LANDMARK)
        .ok_or_else(|| anyhow!("wasi include directory not found"))?;

    let mut result = Vec::with_capacity(patched.len() + 4);
    if let Some(preconf) = ctx.locator.closest(PRECONF_LANDMARK) {
        result.push(format!("-I{}", preconf.display()));
    }
    result.push(format!("-I{}", include_dir.display()));
    result.push("-include".to_string());
    result.push(format!("{}/etc.h", include_dir.display()));
    result.extend(patched);

    if let Some(rules) = &target.rules {
        if !rules.noargs.is_empty() {
            result.retain(|arg| !rules.noargs.iter().any(|pattern| pattern.matches(arg)));
        }
        result.extend(rules.args.iter().cloned());
    }

    Ok(result)
}

fn report(output: Option<&ShadowTarget>, consumed: &[ShadowTarget], compile_only: bool) {
    let Some(target) = output else {
        eprintln!("  (wasi skipped)");
        return;
    };
    eprintln!("  ({} [{}])", target.path, target.kind);
    if !compile_only {
        for input in consumed {
            eprintln!("   - {} [{}]", input.path, input.kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::locate::testing::FixedLocator;
    use crate::shadow::testing::MemStore;
    use std::path::PathBuf;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    fn locator_with_wasi() -> FixedLocator {
        FixedLocator(vec![("wasi", PathBuf::from("/proj/wasi"))])
    }

    #[test]
    fn default_output_is_derived_for_compile_only() {
        let config = Config::default();
        let store = MemStore::of(&[]);
        let locator = locator_with_wasi();
        let ctx = PatchContext {
            config: &config,
            store: &store,
            locator: &locator,
        };

        let patched = patch_args(&args(&["-c", "a.c"]), &ctx).unwrap().unwrap();
        assert_eq!(
            patched,
            args(&[
                "-I/proj/wasi",
                "-include",
                "/proj/wasi/etc.h",
                "-c",
                "a.c",
                "-o",
                "a.wo",
            ])
        );
    }

    #[test]
    fn cxx_sources_participate_in_default_output() {
        let config = Config::default();
        let store = MemStore::of(&[]);
        let locator = locator_with_wasi();
        let ctx = PatchContext {
            config: &config,
            store: &store,
            locator: &locator,
        };

        let patched = patch_args(&args(&["-c", "widget.cpp"]), &ctx)
            .unwrap()
            .unwrap();
        assert!(patched.ends_with(&args(&["-o", "widget.wo"])));
    }

    #[test]
    fn explicit_output_is_rewritten() {
        let config = Config::default();
        let store = MemStore::of(&[]);
        let locator = locator_with_wasi();
        let ctx = PatchContext {
            config: &config,
            store: &store,
            locator: &locator,
        };

        let patched = patch_args(&args(&["-c", "-o", "main.o", "main.c"]), &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(
            patched,
            args(&[
                "-I/proj/wasi",
                "-include",
                "/proj/wasi/etc.h",
                "-c",
                "-o",
                "main.wo",
                "main.c",
            ])
        );
    }

    #[test]
    fn link_step_substitutes_existing_shadow_inputs() {
        let config = Config::default();
        let store = MemStore::of(&["main.wo", "util.wo"]);
        let locator = locator_with_wasi();
        let ctx = PatchContext {
            config: &config,
            store: &store,
            locator: &locator,
        };

        // The link output itself (`app.o` is unusual but mappable) resolves,
        // so the shadow link runs against the shadow objects.
        let patched = patch_args(&args(&["-o", "app.o", "main.o", "util.o"]), &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(
            patched,
            args(&[
                "-I/proj/wasi",
                "-include",
                "/proj/wasi/etc.h",
                "-o",
                "app.wo",
                "main.wo",
                "util.wo",
            ])
        );
    }

    #[test]
    fn unresolvable_output_cancels_the_shadow_build() {
        let config = Config::default();
        let store = MemStore::of(&["main.wo"]);
        let locator = locator_with_wasi();
        let ctx = PatchContext {
            config: &config,
            store: &store,
            locator: &locator,
        };

        let patched = patch_args(&args(&["-o", "app", "main.o"]), &ctx).unwrap();
        assert!(patched.is_none());
    }

    #[test]
    fn discarded_output_goes_to_the_null_device() {
        let config = Config::default();
        let store = MemStore::of(&[]);
        let locator = locator_with_wasi();
        let ctx = PatchContext {
            config: &config,
            store: &store,
            locator: &locator,
        };

        // The second -o resolves, so a shadow build happens; the first one
        // does not resolve and its slot must not point at a real file.
        let patched = patch_args(&args(&["-o", "app", "-o", "out.o"]), &ctx)
            .unwrap()
            .unwrap();
        assert!(patched.contains(&NULL_DEVICE.to_string()));
        assert!(patched.contains(&"out.wo".to_string()));
    }

    #[test]
    fn config_skip_cancels_a_resolved_output() {
        let config: Config = serde_json::from_str(r#"{"main.wo": {"skip": true}}"#).unwrap();
        let store = MemStore::of(&[]);
        let locator = locator_with_wasi();
        let ctx = PatchContext {
            config: &config,
            store: &store,
            locator: &locator,
        };

        let patched = patch_args(&args(&["-c", "-o", "main.o", "main.c"]), &ctx).unwrap();
        assert!(patched.is_none());
    }

    #[test]
    fn missing_wasi_landmark_is_fatal() {
        let config = Config::default();
        let store = MemStore::of(&[]);
        let locator = FixedLocator(vec![]);
        let ctx = PatchContext {
            config: &config,
            store: &store,
            locator: &locator,
        };

        let err = patch_args(&args(&["-c", "a.c"]), &ctx).unwrap_err();
        assert!(err.to_string().contains("wasi include directory"));
    }

    #[test]
    fn preconf_landmark_is_injected_first_when_present() {
        let config = Config::default();
        let store = MemStore::of(&[]);
        let locator = FixedLocator(vec![
            ("wasi", PathBuf::from("/proj/wasi")),
            ("wasi-preconf", PathBuf::from("/proj/wasi-preconf")),
        ]);
        let ctx = PatchContext {
            config: &config,
            store: &store,
            locator: &locator,
        };

        let patched = patch_args(&args(&["-c", "a.c"]), &ctx).unwrap().unwrap();
        assert_eq!(patched[0], "-I/proj/wasi-preconf");
        assert_eq!(patched[1], "-I/proj/wasi");
    }

    #[test]
    fn override_rules_filter_and_extend_arguments() {
        let config: Config = serde_json::from_str(
            r#"{"main.o": {"output": "main.wo",
                "noargs": ["-g", "re:^-O"], "args": ["-DWASI", "-Oz"]}}"#,
        )
        .unwrap();
        let store = MemStore::of(&[]);
        let locator = locator_with_wasi();
        let ctx = PatchContext {
            config: &config,
            store: &store,
            locator: &locator,
        };

        let patched = patch_args(&args(&["-c", "-g", "-O2", "-o", "main.o", "main.c"]), &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(
            patched,
            args(&[
                "-I/proj/wasi",
                "-include",
                "/proj/wasi/etc.h",
                "-c",
                "-o",
                "main.wo",
                "main.c",
                "-DWASI",
                "-Oz",
            ])
        );
    }
}
