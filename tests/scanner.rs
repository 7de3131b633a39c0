#[macro_use]
mod common;

#[cfg(test)]
mod scanner {
    tests! {
        unexpected_character in scanner is ERR
        "[line 1] Error: Unexpected character."
    }

    tests! {
        unterminated_string in scanner is ERR
        "[line 1] Error: Unterminated string."
    }
}
