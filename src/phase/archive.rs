use anyhow::Result;

use crate::shadow;

use super::PatchContext;

/// Archiver invocations look like `ar <action> <output> <members...>`.
/// The shadow archive collects the members whose shadow objects exist; a
/// missing shadow object is excluded rather than replaced by the native
/// one, so an upstream skip degrades the archive instead of polluting it.
pub(super) fn patch_args(args: &[String], ctx: &PatchContext) -> Result<Option<Vec<String>>> {
    let (action, rest) = match args.split_first() {
        Some(split) => split,
        None => return Ok(None),
    };
    let (output, members) = match rest.split_first() {
        Some(split) => split,
        None => return Ok(None),
    };

    // Archives never consult per-path configuration.
    let Some(target) = shadow::map_suffix(output) else {
        eprintln!("  (wasi skipped)");
        return Ok(None);
    };

    let mut patched = vec![action.clone(), target.path.clone()];
    eprintln!("  ({} [{}])", target.path, target.kind);

    let mut included = 0;
    for member in members {
        let Some(input) = shadow::map_suffix(member) else {
            continue;
        };
        if ctx.store.exists(&input.path) {
            eprintln!("   - {} [{}]", input.path, input.kind);
            patched.push(input.path);
            included += 1;
        }
    }

    // An archive with no members is pointless and must not be created.
    if included == 0 {
        eprintln!("   (no inputs - skipped)");
        return Ok(None);
    }

    Ok(Some(patched))
}
