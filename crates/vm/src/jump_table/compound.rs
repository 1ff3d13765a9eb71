//! Compound type handlers: arrays, structs, maps and indexed access.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::{pop_index, to_index, JumpTable};
use crate::op_code::OpCode;
use crate::stack_item::{Array, Map, StackItem, StackItemType, Struct};

/// Registers the compound handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::PACKMAP, packmap);
    jump_table.register(OpCode::PACKSTRUCT, packstruct);
    jump_table.register(OpCode::PACK, pack);
    jump_table.register(OpCode::UNPACK, unpack);
    jump_table.register(OpCode::NEWARRAY0, newarray0);
    jump_table.register(OpCode::NEWARRAY, newarray);
    jump_table.register(OpCode::NEWARRAY_T, newarray_t);
    jump_table.register(OpCode::NEWSTRUCT0, newstruct0);
    jump_table.register(OpCode::NEWSTRUCT, newstruct);
    jump_table.register(OpCode::NEWMAP, newmap);
    jump_table.register(OpCode::SIZE, size);
    jump_table.register(OpCode::HASKEY, haskey);
    jump_table.register(OpCode::KEYS, keys);
    jump_table.register(OpCode::VALUES, values);
    jump_table.register(OpCode::PICKITEM, pickitem);
    jump_table.register(OpCode::APPEND, append);
    jump_table.register(OpCode::SETITEM, setitem);
    jump_table.register(OpCode::REVERSEITEMS, reverseitems);
    jump_table.register(OpCode::REMOVE, remove);
    jump_table.register(OpCode::CLEARITEMS, clearitems);
    jump_table.register(OpCode::POPITEM, popitem);
}

fn invalid_type(opcode: OpCode, item: &StackItem) -> VmError {
    VmError::invalid_operation(format!(
        "invalid type for {opcode}: {}",
        item.stack_item_type()
    ))
}

/// Structs are copied when stored into a container.
fn copy_if_struct(engine: &ExecutionEngine, item: StackItem) -> VmResult<StackItem> {
    match item {
        StackItem::Struct(s) => Ok(StackItem::Struct(
            s.deep_clone(engine.limits().max_stack_size)?,
        )),
        other => Ok(other),
    }
}

fn as_array(item: &StackItem) -> Array {
    match item {
        StackItem::Array(array) => array.clone(),
        StackItem::Struct(s) => s.as_array().clone(),
        _ => Array::default(),
    }
}

fn pop_key(engine: &mut ExecutionEngine) -> VmResult<StackItem> {
    let key = engine.pop()?;
    if !key.is_primitive() {
        return Err(VmError::InvalidType {
            expected: "a primitive key",
            actual: key.stack_item_type(),
        });
    }
    Ok(key)
}

fn pop_count(engine: &mut ExecutionEngine, per_item: usize) -> VmResult<usize> {
    let size = pop_index(engine)?;
    let depth = engine.current_context_or_err()?.evaluation_stack().len();
    if size.saturating_mul(per_item) > depth {
        return Err(VmError::out_of_range(format!(
            "cannot pack {size} item(s) from a stack of {depth}"
        )));
    }
    Ok(size)
}

fn packmap(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let size = pop_count(engine, 2)?;
    let map = Map::new();
    for _ in 0..size {
        let key = pop_key(engine)?;
        key.check_map_key()?;
        let value = engine.pop()?;
        map.insert(key, value);
    }
    engine.push(StackItem::Map(map))
}

fn pop_items(engine: &mut ExecutionEngine) -> VmResult<Vec<StackItem>> {
    let size = pop_count(engine, 1)?;
    let mut items = Vec::with_capacity(size);
    for _ in 0..size {
        items.push(engine.pop()?);
    }
    Ok(items)
}

fn packstruct(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let items = pop_items(engine)?;
    engine.push(StackItem::from_struct(items))
}

fn pack(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let items = pop_items(engine)?;
    engine.push(StackItem::from_array(items))
}

fn unpack(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let compound = engine.pop()?;
    let count = match &compound {
        StackItem::Map(map) => {
            let entries: Vec<_> = map
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            for (key, value) in entries.into_iter().rev() {
                engine.push(value)?;
                engine.push(key)?;
            }
            map.len()
        }
        StackItem::Array(array) => push_reversed(engine, array)?,
        StackItem::Struct(s) => push_reversed(engine, s)?,
        other => return Err(invalid_type(instruction.opcode(), other)),
    };
    engine.push(StackItem::from_int(count as i64))
}

fn push_reversed(engine: &mut ExecutionEngine, array: &Array) -> VmResult<usize> {
    let items = array.to_vec();
    for item in items.iter().rev() {
        engine.push(item.clone())?;
    }
    Ok(items.len())
}

fn newarray0(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::from_array(Vec::new()))
}

fn pop_new_size(engine: &mut ExecutionEngine) -> VmResult<usize> {
    let n = pop_index(engine)?;
    let limit = engine.limits().max_stack_size;
    if n > limit {
        return Err(VmError::out_of_range(format!(
            "MaxStackSize exceed: {n}/{limit}"
        )));
    }
    Ok(n)
}

fn newarray(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_new_size(engine)?;
    engine.push(StackItem::from_array(vec![StackItem::Null; n]))
}

fn newarray_t(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let n = pop_new_size(engine)?;
    let code = instruction.token_u8();
    let item_type = StackItemType::from_u8(code).ok_or_else(|| {
        VmError::invalid_operation(format!("invalid type for NEWARRAY_T: 0x{code:02x}"))
    })?;
    let default = match item_type {
        StackItemType::Boolean => StackItem::Boolean(false),
        StackItemType::Integer => StackItem::from_int(0),
        StackItemType::ByteString => StackItem::ByteString(Vec::new()),
        _ => StackItem::Null,
    };
    engine.push(StackItem::from_array(vec![default; n]))
}

fn newstruct0(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::from_struct(Vec::new()))
}

fn newstruct(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_new_size(engine)?;
    engine.push(StackItem::from_struct(vec![StackItem::Null; n]))
}

fn newmap(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::Map(Map::new()))
}

fn size(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop()?;
    let size = match &x {
        StackItem::Null | StackItem::Pointer { .. } | StackItem::InteropInterface(_) => {
            return Err(invalid_type(instruction.opcode(), &x))
        }
        other => other.size()?,
    };
    engine.push(StackItem::from_int(size as i64))
}

fn haskey(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let key = pop_key(engine)?;
    let x = engine.pop()?;
    let result = match &x {
        StackItem::Map(map) => map.contains_key(&key),
        StackItem::Array(_) | StackItem::Struct(_) | StackItem::Buffer(_) | StackItem::ByteString(_) => {
            let index = key.get_integer()?;
            let index = to_index(&index).ok_or_else(|| {
                VmError::invalid_operation(format!("the negative value {index} is invalid"))
            })?;
            index < x.size()?
        }
        other => return Err(invalid_type(instruction.opcode(), other)),
    };
    engine.push(StackItem::Boolean(result))
}

fn keys(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    match engine.pop()? {
        StackItem::Map(map) => engine.push(StackItem::from_array(map.keys())),
        other => Err(invalid_type(instruction.opcode(), &other)),
    }
}

fn values(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let source = match engine.pop()? {
        StackItem::Array(array) => array.to_vec(),
        StackItem::Struct(s) => s.to_vec(),
        StackItem::Map(map) => map.values(),
        other => return Err(invalid_type(instruction.opcode(), &other)),
    };
    let mut items = Vec::with_capacity(source.len());
    for item in source {
        items.push(copy_if_struct(engine, item)?);
    }
    engine.push(StackItem::from_array(items))
}

fn index_in(key: &StackItem, len: usize) -> VmResult<usize> {
    let index = key.get_integer()?;
    to_index(&index)
        .filter(|i| *i < len)
        .ok_or_else(|| VmError::catchable(format!("the value {index} is out of range")))
}

fn pickitem(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let key = pop_key(engine)?;
    let x = engine.pop()?;
    let item = match &x {
        StackItem::Array(array) => {
            let index = index_in(&key, array.len())?;
            array.get(index).unwrap_or_default()
        }
        StackItem::Struct(s) => {
            let index = index_in(&key, s.len())?;
            s.get(index).unwrap_or_default()
        }
        StackItem::Map(map) => map
            .get(&key)
            .ok_or_else(|| VmError::catchable(format!("key {key:?} not found in Map")))?,
        StackItem::Boolean(_) | StackItem::Integer(_) | StackItem::ByteString(_) | StackItem::Buffer(_) => {
            let bytes = x.get_bytes()?;
            let index = index_in(&key, bytes.len())?;
            StackItem::from_int(bytes[index] as i64)
        }
        other => return Err(invalid_type(instruction.opcode(), other)),
    };
    engine.push(item)
}

fn append(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let item = engine.pop()?;
    let item = copy_if_struct(engine, item)?;
    let parent = engine.pop()?;
    let array = match &parent {
        StackItem::Array(array) => array.clone(),
        StackItem::Struct(s) => s.as_array().clone(),
        other => return Err(invalid_type(instruction.opcode(), other)),
    };
    array.borrow_mut().push(item.clone());
    engine.reference_counter().add_reference(&item, &parent);
    Ok(())
}

fn setitem(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let value = engine.pop()?;
    let value = copy_if_struct(engine, value)?;
    let key = pop_key(engine)?;
    let parent = engine.pop()?;
    let counter = engine.reference_counter().clone();
    match &parent {
        StackItem::Array(_) | StackItem::Struct(_) => {
            let array = as_array(&parent);
            let index = index_in(&key, array.len())?;
            let old = std::mem::replace(&mut array.borrow_mut()[index], value.clone());
            counter.remove_reference(&old, &parent);
            counter.add_reference(&value, &parent);
        }
        StackItem::Map(map) => {
            key.check_map_key()?;
            match map.insert(key.clone(), value.clone()) {
                Some(old) => counter.remove_reference(&old, &parent),
                None => counter.add_reference(&key, &parent),
            }
            counter.add_reference(&value, &parent);
        }
        StackItem::Buffer(buffer) => {
            let index = index_in(&key, buffer.borrow().len())?;
            let byte = value.get_integer()?;
            let byte = i64::try_from(&byte)
                .ok()
                .filter(|b| (-128..=255).contains(b))
                .ok_or_else(|| {
                    VmError::invalid_operation(format!("overflow in SETITEM, {byte} is not a byte"))
                })?;
            buffer.borrow_mut()[index] = byte as u8;
        }
        other => return Err(invalid_type(instruction.opcode(), other)),
    }
    Ok(())
}

fn reverseitems(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    match engine.pop()? {
        StackItem::Array(array) => array.borrow_mut().reverse(),
        StackItem::Struct(s) => s.borrow_mut().reverse(),
        StackItem::Buffer(buffer) => buffer.borrow_mut().reverse(),
        other => return Err(invalid_type(instruction.opcode(), &other)),
    }
    Ok(())
}

fn remove(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let key = pop_key(engine)?;
    let parent = engine.pop()?;
    let counter = engine.reference_counter().clone();
    let array = match &parent {
        StackItem::Array(array) => array.clone(),
        StackItem::Struct(s) => s.as_array().clone(),
        StackItem::Map(map) => {
            if let Some(old) = map.remove(&key) {
                counter.remove_reference(&key, &parent);
                counter.remove_reference(&old, &parent);
            }
            return Ok(());
        }
        other => return Err(invalid_type(instruction.opcode(), other)),
    };
    let index = index_in(&key, array.len())?;
    let old = array.borrow_mut().remove(index);
    counter.remove_reference(&old, &parent);
    Ok(())
}

fn clearitems(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let parent = engine.pop()?;
    let counter = engine.reference_counter().clone();
    let removed: Vec<StackItem> = match &parent {
        StackItem::Array(array) => array.borrow_mut().drain(..).collect(),
        StackItem::Struct(s) => s.borrow_mut().drain(..).collect(),
        StackItem::Map(map) => map
            .borrow_mut()
            .drain(..)
            .flat_map(|(k, v)| [k, v])
            .collect(),
        other => return Err(invalid_type(instruction.opcode(), other)),
    };
    for item in &removed {
        counter.remove_reference(item, &parent);
    }
    Ok(())
}

fn popitem(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let parent = engine.pop()?;
    let array: Array = match &parent {
        StackItem::Array(array) => array.clone(),
        StackItem::Struct(s) => Struct::as_array(s).clone(),
        other => return Err(invalid_type(instruction.opcode(), other)),
    };
    let item = array
        .borrow_mut()
        .pop()
        .ok_or_else(|| VmError::out_of_range("POPITEM on an empty array"))?;
    engine.push(item.clone())?;
    engine.reference_counter().remove_reference(&item, &parent);
    Ok(())
}
