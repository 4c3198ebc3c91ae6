//! Build script — locates and links `libespeak-ng` when the `espeak` feature
//! is enabled.  Without that feature the crate has no native dependency and
//! this script does nothing.
//!
//! ## Resolution order
//!
//! 1. **`ESPEAK_LIB_DIR`** env var — explicit directory containing
//!    `libespeak-ng.{a,so,dylib}`.
//!
//! 2. **pkg-config** — on macOS the search is augmented with Homebrew's
//!    pkgconfig directories so that a plain `brew install espeak-ng` is
//!    sufficient.
//!
//! 3. **Platform path walk** — probes known directories in order:
//!    * macOS: `brew --prefix espeak-ng`, then the canonical Homebrew keg
//!      paths, then `/usr/local/lib`.
//!    * Linux: the Debian/Ubuntu multi-arch directory for the current target,
//!      then `/usr/lib64`, `/usr/lib`, `/usr/local/lib`.
//!
//! At every step a static archive (`libespeak-ng.a`) is preferred; the shared
//! library is the fallback.  When a static archive is linked the C++ standard
//! library is added explicitly because espeak-ng is a C++ project.

use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=ESPEAK_LIB_DIR");
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");

    // Nothing to link unless phonemization is compiled in.
    if std::env::var("CARGO_FEATURE_ESPEAK").is_err() {
        return;
    }

    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

    // ── 1. Explicit override ──────────────────────────────────────────────────
    if let Ok(dir) = std::env::var("ESPEAK_LIB_DIR") {
        link_from_dir(&dir, &target_os);
        return;
    }

    // ── 2. pkg-config ─────────────────────────────────────────────────────────
    if let Some(dir) = try_pkg_config(&target_os) {
        println!("cargo:rustc-link-search=native={dir}");
        return;
    }

    // ── 3. Platform path walk ─────────────────────────────────────────────────
    let candidates = candidate_dirs(&target_os, &target_arch);

    for dir in &candidates {
        if Path::new(dir).join("libespeak-ng.a").exists() {
            println!("cargo:rustc-link-search=native={dir}");
            println!("cargo:rustc-link-lib=static=espeak-ng");
            link_cxx(&target_os);
            return;
        }
    }

    let dylib = if target_os == "macos" { "libespeak-ng.dylib" } else { "libespeak-ng.so" };
    for dir in &candidates {
        if Path::new(dir).join(dylib).exists() {
            println!("cargo:rustc-link-search=native={dir}");
            println!("cargo:rustc-link-lib=dylib=espeak-ng");
            return;
        }
    }

    // ── 4. Nothing found ──────────────────────────────────────────────────────
    panic!(
        "\n\n\
         kokorotts: could not find libespeak-ng.\n\
         \n\
         Install it with:\n\
         \n\
         \t  macOS   :  brew install espeak-ng\n\
         \t  Ubuntu  :  sudo apt install libespeak-ng-dev\n\
         \t  Fedora  :  sudo dnf install espeak-ng-devel\n\
         \t  Alpine  :  apk add espeak-ng-dev\n\
         \t  Arch    :  sudo pacman -S espeak-ng\n\
         \n\
         Or point the build script directly at the library:\n\
         \n\
         \t  ESPEAK_LIB_DIR=/your/path/lib cargo build --features espeak\n\n"
    );
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Emit link directives for the library found inside `dir`.
/// Prefers `libespeak-ng.a`; falls back to the shared library.
fn link_from_dir(dir: &str, target_os: &str) {
    println!("cargo:rustc-link-search=native={dir}");
    if Path::new(dir).join("libespeak-ng.a").exists() {
        println!("cargo:rustc-link-lib=static=espeak-ng");
        link_cxx(target_os);
    } else {
        println!("cargo:rustc-link-lib=dylib=espeak-ng");
    }
}

/// Emit the C++ standard-library link needed when statically linking espeak-ng.
fn link_cxx(target_os: &str) {
    if target_os == "macos" {
        println!("cargo:rustc-link-lib=dylib=c++");
    } else {
        println!("cargo:rustc-link-lib=dylib=stdc++");
    }
}

/// Try pkg-config, augmenting `PKG_CONFIG_PATH` with Homebrew directories on
/// macOS.  Returns the libdir on success so the caller can emit
/// `rustc-link-search`.
fn try_pkg_config(target_os: &str) -> Option<String> {
    let mut extra: Vec<String> = Vec::new();

    if target_os == "macos" {
        for prefix in ["/opt/homebrew", "/usr/local"] {
            let p = format!("{prefix}/lib/pkgconfig");
            if Path::new(&p).is_dir() { extra.push(p); }
            let p = format!("{prefix}/share/pkgconfig");
            if Path::new(&p).is_dir() { extra.push(p); }
        }

        // `brew --prefix espeak-ng` gives the exact keg path even when the
        // formula is keg-only and not linked into the standard Homebrew prefix.
        if let Some(keg) = brew_prefix("espeak-ng") {
            let p = format!("{keg}/lib/pkgconfig");
            if Path::new(&p).is_dir() { extra.insert(0, p); }
        }
    }

    let existing = std::env::var("PKG_CONFIG_PATH").unwrap_or_default();
    if !existing.is_empty() { extra.push(existing); }

    let pkg_path = extra.join(":");

    // Call pkg-config directly so the augmented path can be passed as an
    // environment variable without mutating the process environment.
    let out = Command::new("pkg-config")
        .args(["--libs", "--cflags", "espeak-ng"])
        .env("PKG_CONFIG_PATH", &pkg_path)
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }

    let flags = String::from_utf8(out.stdout).ok()?;
    for token in flags.split_whitespace() {
        if let Some(path) = token.strip_prefix("-L") {
            println!("cargo:rustc-link-search=native={path}");
        } else if let Some(lib) = token.strip_prefix("-l") {
            println!("cargo:rustc-link-lib=dylib={lib}");
        }
        // -I, -D etc. (cflags) are ignored — phonemize.rs uses no includes.
    }

    let libdir = pkg_config_variable("espeak-ng", "libdir", &pkg_path).unwrap_or_default();
    Some(libdir)
}

/// Call `pkg-config --variable=<var> <package>`.
fn pkg_config_variable(package: &str, var: &str, pkg_path: &str) -> Option<String> {
    let out = Command::new("pkg-config")
        .args([&format!("--variable={var}"), package])
        .env("PKG_CONFIG_PATH", pkg_path)
        .output()
        .ok()?;
    if out.status.success() {
        Some(String::from_utf8(out.stdout).ok()?.trim().to_owned())
    } else {
        None
    }
}

/// Run `brew --prefix <formula>` and return the keg path on success.
fn brew_prefix(formula: &str) -> Option<String> {
    let out = Command::new("brew")
        .args(["--prefix", formula])
        .output()
        .ok()?;
    if out.status.success() {
        Some(String::from_utf8(out.stdout).ok()?.trim().to_owned())
    } else {
        None
    }
}

/// Ordered list of directories to probe for `libespeak-ng.{a,so,dylib}`.
fn candidate_dirs(target_os: &str, target_arch: &str) -> Vec<String> {
    let mut dirs: Vec<String> = Vec::new();

    if target_os == "macos" {
        if let Some(keg) = brew_prefix("espeak-ng") {
            dirs.push(format!("{keg}/lib"));
        }
        for prefix in ["/opt/homebrew", "/usr/local"] {
            dirs.push(format!("{prefix}/opt/espeak-ng/lib"));
            dirs.push(format!("{prefix}/lib"));
        }
    } else {
        let multiarch = match target_arch {
            "x86_64"  => "x86_64-linux-gnu",
            "aarch64" => "aarch64-linux-gnu",
            "arm"     => "arm-linux-gnueabihf",
            _         => "",
        };
        if !multiarch.is_empty() {
            dirs.push(format!("/usr/lib/{multiarch}"));
        }
        dirs.extend(["/usr/lib64", "/usr/lib", "/usr/local/lib"].map(String::from));
    }

    dirs.into_iter()
        .map(PathBuf::from)
        .filter(|p| p.is_dir())
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}
