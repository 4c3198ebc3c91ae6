//! Phonemization — the oracle that turns a text fragment into a raw phoneme
//! string.
//!
//! The oracle sits behind the [`Phonemizer`] trait so that the encoding
//! pipeline is testable without a native library: tests supply a fixture
//! backend, applications use [`EspeakBackend`] (feature `espeak`), which
//! calls the espeak-ng C API directly instead of spawning a subprocess.
//!
//! The contract is deliberately loose, matching espeak-ng itself: there is no
//! structured error channel, and an empty string means "no phonemes for this
//! fragment" — the encoder recovers from that locally.
//!
//! ## Build requirements (feature `espeak`)
//! | Platform             | Requirement                                    |
//! |----------------------|------------------------------------------------|
//! | Alpine / Linux       | `apk add espeak-ng-dev` / `apt install libespeak-ng-dev` |
//! | macOS (Homebrew)     | `brew install espeak-ng`                       |

use anyhow::Result;

/// Locale tag the Kokoro model was trained against.
pub const EN_US: &str = "en-us";

/// Separator espeak places between phonemes when asked to; the rule engine
/// strips it after normalization.
pub const PHONEME_SEPARATOR: char = '_';

/// A text-fragment → raw-phoneme-string oracle.
///
/// Implementations must treat the fragment as one phrase (no punctuation
/// handling is expected of them) and may return an empty string when the
/// fragment produces no phonemes.
pub trait Phonemizer {
    fn phonemize(&self, text: &str) -> Result<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// espeak-ng backend (feature "espeak")
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "espeak")]
pub use espeak::{is_espeak_available, set_data_path, EspeakBackend};

#[cfg(feature = "espeak")]
mod espeak {
    use super::{Phonemizer, PHONEME_SEPARATOR};
    use std::{
        ffi::{CStr, CString},
        os::raw::{c_char, c_int, c_void},
        path::{Path, PathBuf},
        sync::Mutex,
    };

    use anyhow::{anyhow, Result};
    use once_cell::sync::OnceCell;

    // ─── FFI bindings ─────────────────────────────────────────────────────────
    // Linking is handled by build.rs (pkg-config or path probe).  No #[link]
    // attribute here so the same source compiles for every target.

    extern "C" {
        /// Set the directory that contains `espeak-ng-data/`.
        /// Pass `NULL` to use the library's compiled-in default.
        fn espeak_ng_InitializePath(path: *const c_char);

        /// Initialise the phoneme tables.  Must be called after InitializePath.
        /// Returns ENS_OK (0) on success.
        fn espeak_ng_Initialize(context: *mut c_void) -> c_int;

        /// Select the voice used for phonemisation.
        /// Returns EE_OK (0) on success.
        fn espeak_ng_SetVoiceByName(name: *const c_char) -> c_int;

        /// Translate text to phonemes.
        ///
        /// `textptr` is an in/out pointer: on entry it points to the start of
        /// the text; on return it has advanced past the translated clause, or
        /// been set to `NULL` when the entire text has been consumed.
        ///
        /// Returns a pointer to an internal buffer holding the phonemes for
        /// the current clause, or `NULL` for an empty clause.  Copy the string
        /// before making any further espeak-ng calls.
        fn espeak_TextToPhonemes(
            textptr: *mut *const c_void,
            textmode: c_int,
            phonememode: c_int,
        ) -> *const c_char;
    }

    /// `textmode` value: input is UTF-8.
    const CHARS_UTF8: c_int = 1;

    /// `phonememode` bit: output IPA.
    const PHONEMES_IPA: c_int = 0x02;

    /// Full phoneme mode: IPA output with `_` between phonemes.
    /// High byte carries the separator character, low byte the option bits.
    const fn phoneme_mode() -> c_int {
        ((PHONEME_SEPARATOR as c_int) << 8) | PHONEMES_IPA
    }

    // ─── Global state ─────────────────────────────────────────────────────────

    /// Serialises every call into the espeak-ng library.
    /// espeak-ng uses global state and is not thread-safe.
    static LOCK: Mutex<()> = Mutex::new(());

    /// Cached result of the one-time initialisation.
    static INIT: OnceCell<std::result::Result<(), String>> = OnceCell::new();

    /// Optional runtime path to `espeak-ng-data/`, set before first use.
    static DATA_PATH: OnceCell<PathBuf> = OnceCell::new();

    /// Set the path to the `espeak-ng-data` directory.
    ///
    /// Optional on desktop — if not called the library searches its
    /// compiled-in system path.  Has no effect once the library has been
    /// initialised.
    pub fn set_data_path(path: &Path) {
        let _ = DATA_PATH.set(path.to_path_buf());
    }

    /// Called exactly once (inside LOCK) to initialise the espeak-ng library.
    fn do_init() -> std::result::Result<(), String> {
        unsafe {
            let path_cstr: Option<CString> = DATA_PATH.get().map(|p| {
                CString::new(p.to_string_lossy().as_bytes())
                    .expect("espeak data path contains a null byte")
            });
            let path_ptr: *const c_char =
                path_cstr.as_ref().map_or(std::ptr::null(), |c| c.as_ptr());

            espeak_ng_InitializePath(path_ptr);

            // ENS_OK = 0
            let status = espeak_ng_Initialize(std::ptr::null_mut());
            if status != 0 {
                return Err(format!("espeak_ng_Initialize failed (status {status:#010x})"));
            }
        }
        Ok(())
    }

    /// Returns `true` if espeak-ng initialises successfully.
    pub fn is_espeak_available() -> bool {
        let _guard = LOCK.lock().unwrap_or_else(|p| p.into_inner());
        INIT.get_or_init(do_init).is_ok()
    }

    // ─── Backend ──────────────────────────────────────────────────────────────

    /// Phonemizer backed by libespeak-ng, locked to one locale tag.
    pub struct EspeakBackend {
        locale: CString,
    }

    impl EspeakBackend {
        /// Create a backend for `locale` (e.g. `"en-us"`).
        pub fn new(locale: &str) -> Result<Self> {
            let locale = CString::new(locale)
                .map_err(|_| anyhow!("locale tag contains a null byte"))?;
            Ok(Self { locale })
        }
    }

    impl Phonemizer for EspeakBackend {
        /// Convert `text` to a raw phoneme string with `_` separators,
        /// using the backend's locale.
        fn phonemize(&self, text: &str) -> Result<String> {
            let _guard = LOCK.lock().unwrap_or_else(|p| p.into_inner());

            INIT.get_or_init(do_init)
                .as_ref()
                .map_err(|e| anyhow!("espeak-ng: {e}"))?;

            unsafe {
                let rc = espeak_ng_SetVoiceByName(self.locale.as_ptr());
                if rc != 0 {
                    return Err(anyhow!(
                        "espeak_ng_SetVoiceByName({:?}) failed (rc {rc})",
                        self.locale
                    ));
                }
            }

            let text_c = CString::new(text)
                .map_err(|_| anyhow!("phonemize: text contains a null byte"))?;

            // `current` is the cursor that espeak_TextToPhonemes advances
            // through the input one clause at a time.
            let mut current: *const c_void = text_c.as_ptr() as *const c_void;
            let mut parts: Vec<String> = Vec::new();

            unsafe {
                while !current.is_null() {
                    let phonemes_ptr =
                        espeak_TextToPhonemes(&mut current, CHARS_UTF8, phoneme_mode());

                    if phonemes_ptr.is_null() {
                        // Empty clause (e.g. leading whitespace) — keep looping.
                        continue;
                    }

                    // Copy out before the next call overwrites the buffer.
                    let chunk = CStr::from_ptr(phonemes_ptr)
                        .to_str()
                        .map_err(|_| anyhow!("espeak-ng returned non-UTF-8 phonemes"))?
                        .trim()
                        .to_owned();

                    if !chunk.is_empty() {
                        parts.push(chunk);
                    }
                }
            }

            Ok(parts.join(" "))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::phonemize::EN_US;

        #[test]
        fn test_availability() {
            // If the crate linked (build succeeded), the library is present.
            assert!(is_espeak_available());
        }

        #[test]
        fn test_phonemize_hello() {
            let backend = EspeakBackend::new(EN_US).unwrap();
            let raw = backend.phonemize("hello world").expect("phonemize failed");
            assert!(!raw.is_empty());
            assert!(
                raw.contains(PHONEME_SEPARATOR),
                "expected separator-joined phonemes, got: {raw}"
            );
        }

        #[test]
        fn test_phonemize_empty() {
            let backend = EspeakBackend::new(EN_US).unwrap();
            let raw = backend.phonemize("").expect("phonemize failed");
            assert!(raw.trim().is_empty(), "expected no phonemes, got: {raw}");
        }
    }
}
