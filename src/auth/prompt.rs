//! Origem do authorization_code quando não há refresh token salvo
//!
//! Na biblioteca o prompt é um callback injetável; o CLI usa [`StdinPrompt`].

use std::io::{self, BufRead, Write};

use crate::error::{PachcaError, PachcaResult};

/// Fornece um authorization_code sob demanda
pub trait CodePrompt: Send + Sync {
    fn request_code(&self) -> PachcaResult<String>;
}

impl<F> CodePrompt for F
where
    F: Fn() -> PachcaResult<String> + Send + Sync,
{
    fn request_code(&self) -> PachcaResult<String> {
        self()
    }
}

/// Pergunta o código no terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

impl CodePrompt for StdinPrompt {
    fn request_code(&self) -> PachcaResult<String> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        read_code(stdin.lock(), stdout.lock())
    }
}

/// Escreve o prompt em `output` e lê uma linha de `input`
pub fn read_code<R: BufRead, W: Write>(mut input: R, mut output: W) -> PachcaResult<String> {
    write!(output, "Введите authorization_code\n>>> ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(PachcaError::validation("no authorization code entered"));
    }

    Ok(line.trim().to_string())
}
