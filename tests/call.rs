#[macro_use]
mod common;

#[cfg(test)]
mod call {
    tests! {
        native_clock in call is OK
        "true"
    }

    tests! {
        not_callable in call is ERR
        "Can only call functions and classes, got string."
        "[line 2]"
    }

    tests! {
        wrong_arity in call is ERR
        "Expected 2 arguments but got 1."
        "[line 2]"
    }
}
