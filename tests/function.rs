#[macro_use]
mod common;

#[cfg(test)]
mod function {
    tests! {
        print in function is OK
        "<fn foo>"
    }

    tests! {
        recursion in function is OK
        "21"
    }

    tests! {
        mutual_recursion in function is OK
        "true"
    }

    tests! {
        empty_body in function is OK
        "nil"
    }

    tests! {
        missing_arguments in function is ERR
        "Expected 2 arguments but got 1."
        "[line 2]"
    }
}
