use anyhow::Result;

use crate::shadow;

use super::PatchContext;

/// A shadow move is all-or-nothing: if any non-flag argument has no shadow
/// counterpart, moving only a subset would desynchronize the native and
/// shadow artifact trees, so the whole shadow step is dropped.
pub(super) fn patch_args(args: &[String], _ctx: &PatchContext) -> Result<Option<Vec<String>>> {
    if args.is_empty() {
        return Ok(None);
    }

    let mut patched = Vec::with_capacity(args.len());
    for arg in args {
        if arg.starts_with('-') {
            patched.push(arg.clone());
            continue;
        }
        match shadow::map_suffix(arg) {
            Some(target) => patched.push(target.path),
            None => {
                eprintln!("  (wasi skipped)");
                return Ok(None);
            }
        }
    }
    Ok(Some(patched))
}
