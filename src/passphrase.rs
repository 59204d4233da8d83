//! Passphrase sources for the CLI.

use std::io::{self, IsTerminal, Read, Write};

use zeroize::Zeroizing;

use crate::error::{Result, VaultError};

/// Something that can produce a passphrase, as raw bytes.
pub trait PassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Fixed passphrase, for tests and library callers.
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: impl Into<Vec<u8>>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(self.passphrase.clone())
    }
}

/// Reads the whole stream and strips one trailing newline, so
/// `echo pw | cipherledger --passphrase-stdin ...` does what it looks like.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader
            .read_to_end(&mut data)
            .map_err(|e| VaultError::PassphraseUnavailable(format!("error reading passphrase: {e}")))?;
        if data.last() == Some(&b'\n') {
            data.pop();
            if data.last() == Some(&b'\r') {
                data.pop();
            }
        }
        Ok(data)
    }
}

/// Prompts on stderr and reads without echo.
#[derive(Default)]
pub struct TerminalPassphraseReader;

impl PassphraseReader for TerminalPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(VaultError::PassphraseUnavailable(
                "stdin is not a terminal; use --passphrase-stdin".into(),
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(b"Passphrase (cipherledger): ")
            .and_then(|()| stderr.flush())
            .map_err(|e| VaultError::PassphraseUnavailable(format!("failed to write prompt: {e}")))?;

        // rpassword hands back a plain String; move it into zeroizing storage at once.
        let passphrase = rpassword::read_password()
            .map_err(|e| VaultError::PassphraseUnavailable(format!("failure reading passphrase: {e}")))?;
        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}

pub fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn constant_reader_repeats() {
        let mut reader = ConstantPassphraseReader::new("pw");
        assert_eq!(&**reader.read_passphrase().unwrap(), b"pw");
        assert_eq!(&**reader.read_passphrase().unwrap(), b"pw");
    }

    #[test]
    fn stream_reader_strips_one_newline() {
        let mut reader = ReaderPassphraseReader::new(Box::new(Cursor::new(b"secret\n".to_vec())));
        assert_eq!(&**reader.read_passphrase().unwrap(), b"secret");

        let mut reader = ReaderPassphraseReader::new(Box::new(Cursor::new(b"secret\r\n".to_vec())));
        assert_eq!(&**reader.read_passphrase().unwrap(), b"secret");

        let mut reader = ReaderPassphraseReader::new(Box::new(Cursor::new(b" two words \n\n".to_vec())));
        assert_eq!(&**reader.read_passphrase().unwrap(), b" two words \n");
    }

    #[test]
    fn stream_reader_keeps_non_utf8() {
        let mut reader = ReaderPassphraseReader::new(Box::new(Cursor::new(vec![0xFF, 0x00, 0x80])));
        assert_eq!(&**reader.read_passphrase().unwrap(), &[0xFF, 0x00, 0x80]);
    }
}
