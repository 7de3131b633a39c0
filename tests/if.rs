#[macro_use]
mod common;

#[cfg(test)]
mod if_stmt {
    tests! {
        then_and_else in if is OK
        "then"
        "else"
    }

    tests! {
        dangling_else in if is OK
        "yes"
    }

    tests! {
        truthiness in if is OK
        "zero is truthy"
        "empty string is truthy"
        "nil is falsy"
    }
}
