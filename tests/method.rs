#[macro_use]
mod common;

#[cfg(test)]
mod method {
    tests! {
        arity in method is OK
        "3"
    }

    tests! {
        print_bound in method is OK
        "<fn method>"
    }

    tests! {
        not_found in method is ERR
        "Undefined property 'bar'."
        "[line 3]"
    }
}
