#[macro_use]
mod common;

#[cfg(test)]
mod number {
    tests! {
        literals in number is OK
        "123"
        "123.456"
        "0.001"
    }

    tests! {
        whole_number_display in number is OK
        "1"
        "2"
    }

    tests! {
        nan_equality in number is OK
        "false"
    }

    tests! {
        trailing_dot in number is ERR
        "[line 1] Error at ';': Expect property name after '.'."
    }
}
