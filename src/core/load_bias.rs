use anyhow::{anyhow, Context, Result};
use proc_maps::get_process_maps;

use crate::core::types::Pid;

/// Returns the base address at which the current executable's image is
/// mapped, by parsing the process's own mapping metadata. Instruction
/// pointers captured at runtime are absolute, so subtracting this bias turns
/// them into file-relative offsets that stay comparable across runs even
/// when the image lands at an ASLR-randomized address.
///
/// The module layout is assumed stable for the process lifetime, but the
/// maps are still re-read on every call rather than cached so that there's
/// no ordering hazard with process startup.
pub fn load_bias() -> Result<u64> {
    let exe = std::env::current_exe().context("Couldn't resolve the current executable path")?;
    let maps = get_process_maps(std::process::id() as Pid)
        .context("Couldn't read the process memory maps")?;

    // The image's lowest mapping is where the loader placed its base.
    maps.iter()
        .filter(|map| map.filename().map_or(false, |path| path == exe))
        .map(|map| map.start() as u64)
        .min()
        .ok_or_else(|| anyhow!("No mapping found for {}", exe.display()))
}

#[cfg(test)]
mod tests {
    use super::load_bias;

    #[test]
    fn test_load_bias_is_page_aligned() {
        let _ = env_logger::builder().is_test(true).try_init();

        let bias = load_bias().expect("failed to find the executable's mapping");
        assert_eq!(bias % 0x1000, 0, "load bias {:#x} isn't page aligned", bias);
    }

    #[test]
    fn test_load_bias_is_stable_across_queries() {
        let first = load_bias().expect("failed to find the executable's mapping");
        let second = load_bias().expect("failed to find the executable's mapping");
        assert_eq!(first, second);
    }
}
