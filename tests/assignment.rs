#[macro_use]
mod common;

#[cfg(test)]
mod assignment {
    tests! {
        global in assignment is OK
        "before"
        "after"
    }

    tests! {
        local in assignment is OK
        "before"
        "after"
    }

    tests! {
        associativity in assignment is OK
        "c"
        "c"
        "c"
    }

    tests! {
        syntax in assignment is OK
        "assigned"
        "assigned"
    }

    tests! {
        invalid_target in assignment is ERR
        "[line 2] Error at '=': Invalid assignment target."
    }
}
