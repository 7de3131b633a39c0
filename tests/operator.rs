#[macro_use]
mod common;

#[cfg(test)]
mod operator {
    tests! {
        arithmetic in operator is OK
        "8"
        "20"
        "5"
        "-5"
    }

    tests! {
        comparison in operator is OK
        "true"
        "true"
        "true"
        "false"
    }

    tests! {
        equality in operator is OK
        "true"
        "false"
        "true"
        "false"
        "true"
    }

    tests! {
        not in operator is OK
        "false"
        "true"
        "true"
        "false"
    }

    tests! {
        divide_by_zero in operator is OK
        "inf"
        "-inf"
        "NaN"
    }

    tests! {
        add_mismatched_types in operator is ERR
        "Operands must be two numbers or two strings."
        "[line 1]"
    }

    tests! {
        subtract_non_numbers in operator is ERR
        "Operands must be numbers."
        "[line 1]"
    }

    tests! {
        negate_non_number in operator is ERR
        "Operand must be a number."
        "[line 1]"
    }

    tests! {
        comparison_non_numbers in operator is ERR
        "Operands must be numbers."
        "[line 1]"
    }
}
