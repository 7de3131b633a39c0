#[macro_use]
mod common;

#[cfg(test)]
mod string {
    tests! {
        literals in string is OK
        "hello"
        ""
        "ab"
    }

    tests! {
        multiline in string is OK
        "1
2"
    }

    tests! {
        unterminated in string is ERR
        "[line 1] Error: Unterminated string."
    }
}
